//! 编解码配置与递归深度控制。
//!
//! # 设计初心（Why）
//! - 字段表、数组与字段值的解码互相递归，嵌套深度完全由对端决定；仅依赖原生调用栈会让恶意报文触发栈溢出；
//! - 解码与编码在深度控制上逻辑一致，仅错误方向不同，抽成共享的 [`DepthBudget`] 可确保两端语义统一。
//!
//! # 行为拆解（How）
//! - [`DecodeOptions`]/[`EncodeOptions`] 以 `const` 构造器 + 链式方法配置；
//! - `Nested::enter` 返回 RAII 守卫，离开作用域自动回退计数，避免遗漏手动减计数；
//! - 守卫实现 `Deref`/`DerefMut` 到其所属的编解码器，递归调用经由守卫进行。
//!
//! # 契约定义（What）
//! - 顶层容器与每一层嵌套容器各占一层深度；深度等于上限的输入仍可解码，超过即返回
//!   [`FieldTableError::DepthExceeded`]；
//! - 编码侧默认使用与解码侧相同的上限，保证编码产物总能被默认配置的解码器接受。

use core::{
    num::NonZeroU16,
    ops::{Deref, DerefMut},
};

use crate::error::FieldTableError;

/// 默认最大嵌套深度。
pub const DEFAULT_MAX_DEPTH: NonZeroU16 = match NonZeroU16::new(64) {
    Some(depth) => depth,
    None => unreachable!(),
};

/// 容器长度字段的校验策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LengthPolicy {
    /// 声明长度必须落在输入范围内，且最后一个条目必须恰好结束于声明边界。
    #[default]
    Strict,
    /// 读取位置到达或越过声明边界即停止，接受越界的最后一个条目。
    ///
    /// 仅用于兼容不规范的对端。
    Lenient,
}

/// 解码配置。
///
/// # 契约说明（What）
/// - `max_depth`：允许的最大容器嵌套层数；
/// - `length_policy`：容器长度字段的校验策略，默认 [`LengthPolicy::Strict`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeOptions {
    max_depth: NonZeroU16,
    length_policy: LengthPolicy,
}

impl DecodeOptions {
    /// 默认配置：深度上限 [`DEFAULT_MAX_DEPTH`]，严格长度校验。
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            length_policy: LengthPolicy::Strict,
        }
    }

    /// 设置最大嵌套深度。
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: NonZeroU16) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 设置长度校验策略。
    #[must_use]
    pub const fn with_length_policy(mut self, length_policy: LengthPolicy) -> Self {
        self.length_policy = length_policy;
        self
    }

    /// 最大嵌套深度。
    #[must_use]
    pub const fn max_depth(&self) -> NonZeroU16 {
        self.max_depth
    }

    /// 长度校验策略。
    #[must_use]
    pub const fn length_policy(&self) -> LengthPolicy {
        self.length_policy
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// 编码配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncodeOptions {
    max_depth: NonZeroU16,
}

impl EncodeOptions {
    /// 默认配置，深度上限与 [`DecodeOptions::new`] 一致。
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// 设置最大嵌套深度。
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: NonZeroU16) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 最大嵌套深度。
    #[must_use]
    pub const fn max_depth(&self) -> NonZeroU16 {
        self.max_depth
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// 三个互递归例程共享的深度计数器。
#[derive(Debug, Clone)]
pub(crate) struct DepthBudget {
    limit: NonZeroU16,
    current: u16,
}

impl DepthBudget {
    pub(crate) const fn new(limit: NonZeroU16) -> Self {
        Self { limit, current: 0 }
    }

    pub(crate) const fn current(&self) -> u16 {
        self.current
    }

    fn try_descend(&mut self) -> Result<(), FieldTableError> {
        if self.current >= self.limit.get() {
            return Err(FieldTableError::DepthExceeded {
                limit: self.limit.get(),
            });
        }
        self.current += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

/// 持有 [`DepthBudget`] 的编解码状态。
pub(crate) trait Nested {
    fn depth_mut(&mut self) -> &mut DepthBudget;

    /// 进入下一层容器，返回离开时自动回退深度的守卫。
    fn enter(&mut self) -> Result<DepthGuard<'_, Self>, FieldTableError>
    where
        Self: Sized,
    {
        self.depth_mut().try_descend()?;
        Ok(DepthGuard { owner: self })
    }
}

/// 递归深度的 RAII 守卫。
///
/// - 只能通过 [`Nested::enter`] 构造；
/// - 离开作用域必定回退一层，错误路径经 `?` 提前返回时同样成立。
pub(crate) struct DepthGuard<'s, T: Nested> {
    owner: &'s mut T,
}

impl<T: Nested> Deref for DepthGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: Nested> DerefMut for DepthGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: Nested> Drop for DepthGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.depth_mut().ascend();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nest(DepthBudget);

    impl Nested for Nest {
        fn depth_mut(&mut self) -> &mut DepthBudget {
            &mut self.0
        }
    }

    fn depth(limit: u16) -> NonZeroU16 {
        NonZeroU16::new(limit).unwrap()
    }

    #[test]
    fn guard_restores_depth_on_drop() {
        let mut nest = Nest(DepthBudget::new(depth(2)));
        {
            let mut outer = nest.enter().unwrap();
            assert_eq!(outer.0.current(), 1);
            {
                let inner = outer.enter().unwrap();
                assert_eq!(inner.0.current(), 2);
            }
            assert_eq!(outer.0.current(), 1);
        }
        assert_eq!(nest.0.current(), 0);
    }

    #[test]
    fn entering_beyond_limit_fails_without_counting() {
        let mut nest = Nest(DepthBudget::new(depth(1)));
        let mut guard = nest.enter().unwrap();
        assert_eq!(
            guard.enter().err(),
            Some(FieldTableError::DepthExceeded { limit: 1 })
        );
        assert_eq!(guard.0.current(), 1);
        drop(guard);
        assert_eq!(nest.0.current(), 0);
    }

    #[test]
    fn builders_override_defaults() {
        let options = DecodeOptions::default()
            .with_max_depth(depth(3))
            .with_length_policy(LengthPolicy::Lenient);
        assert_eq!(options.max_depth().get(), 3);
        assert_eq!(options.length_policy(), LengthPolicy::Lenient);
        assert_eq!(EncodeOptions::default().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(DecodeOptions::new().length_policy(), LengthPolicy::Strict);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn decode_options_load_from_json() {
        let options: DecodeOptions =
            serde_json::from_str(r#"{"max_depth": 8, "length_policy": "lenient"}"#).unwrap();
        assert_eq!(options.max_depth().get(), 8);
        assert_eq!(options.length_policy(), LengthPolicy::Lenient);

        let defaults: DecodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, DecodeOptions::new());
    }
}
