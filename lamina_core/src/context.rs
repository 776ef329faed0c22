// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing contexts and the current-context stack.
//!
//! [`Canvas`] is the drawing surface every backend implements. Drawing helpers
//! that do not receive a canvas explicitly ask a [`ContextStack`] for the
//! [current](ContextStack::current) one. Pushes are paired with pops through
//! [`ContextStack::scoped`], whose guard pops on drop, so an early return
//! (including `?`) never leaves a stale context on the stack.
//!
//! Contexts are shared as `Rc<RefCell<dyn Canvas>>`; the stack and everything
//! that holds a context are confined to one thread. A shared context is
//! itself a [`Canvas`] that borrows the underlying surface for one call at a
//! time, so code holding the handle and code asking the stack for the
//! current context can interleave their drawing.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Affine, BezPath, Point, Size};

use crate::color::Rgba;
use crate::text::TextStyle;

/// A drawing surface.
///
/// Coordinates are y-down. `save_state`/`restore_state` bracket the current
/// transform and clip; clips only ever intersect.
pub trait Canvas {
    /// Size of the surface in its own units.
    fn size(&self) -> Size;

    /// Pushes the current transform and clip.
    fn save_state(&mut self);

    /// Pops the transform and clip saved by the matching
    /// [`save_state`](Self::save_state). Unbalanced calls are ignored.
    fn restore_state(&mut self);

    /// Pre-multiplies `affine` into the current transform.
    fn concat_transform(&mut self, affine: Affine);

    /// Intersects the clip with `path` (non-zero fill rule).
    fn clip_path(&mut self, path: &BezPath);

    /// Fills `path` (non-zero fill rule).
    fn fill_path(&mut self, path: &BezPath, color: Rgba);

    /// Strokes `path` with a line of `width`.
    fn stroke_path(&mut self, path: &BezPath, color: Rgba, width: f64);

    /// Draws a single run of text whose line box has its top-left at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle);
}

/// A shared drawing context.
pub type ContextRef = Rc<RefCell<dyn Canvas>>;

/// A zero-size canvas that discards everything drawn into it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn size(&self) -> Size {
        Size::ZERO
    }
    fn save_state(&mut self) {}
    fn restore_state(&mut self) {}
    fn concat_transform(&mut self, _affine: Affine) {}
    fn clip_path(&mut self, _path: &BezPath) {}
    fn fill_path(&mut self, _path: &BezPath, _color: Rgba) {}
    fn stroke_path(&mut self, _path: &BezPath, _color: Rgba, _width: f64) {}
    fn draw_text(&mut self, _text: &str, _origin: Point, _style: &TextStyle) {}
}

/// Wraps a canvas into a shareable [`ContextRef`].
pub fn context_ref<C: Canvas + 'static>(canvas: C) -> ContextRef {
    Rc::new(RefCell::new(canvas))
}

/// Forwards each call to the shared canvas, holding the borrow only for that
/// call.
///
/// # Panics
///
/// Every method panics if the canvas is already mutably borrowed by the
/// caller.
impl<C: Canvas + ?Sized> Canvas for Rc<RefCell<C>> {
    fn size(&self) -> Size {
        self.borrow().size()
    }
    fn save_state(&mut self) {
        self.borrow_mut().save_state();
    }
    fn restore_state(&mut self) {
        self.borrow_mut().restore_state();
    }
    fn concat_transform(&mut self, affine: Affine) {
        self.borrow_mut().concat_transform(affine);
    }
    fn clip_path(&mut self, path: &BezPath) {
        self.borrow_mut().clip_path(path);
    }
    fn fill_path(&mut self, path: &BezPath, color: Rgba) {
        self.borrow_mut().fill_path(path, color);
    }
    fn stroke_path(&mut self, path: &BezPath, color: Rgba, width: f64) {
        self.borrow_mut().stroke_path(path, color, width);
    }
    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        self.borrow_mut().draw_text(text, origin, style);
    }
}

/// A stack of drawing contexts.
///
/// The stack uses interior mutability so that a [`ContextGuard`] can hold a
/// shared borrow while drawing code keeps asking for the current context.
pub struct ContextStack {
    stack: RefCell<Vec<ContextRef>>,
    fallback: ContextRef,
}

impl fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStack")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    /// Creates an empty stack whose fallback is a [`NullCanvas`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(context_ref(NullCanvas))
    }

    /// Creates an empty stack with a custom fallback context.
    #[must_use]
    pub fn with_fallback(fallback: ContextRef) -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            fallback,
        }
    }

    /// Makes `context` current.
    pub fn push(&self, context: ContextRef) {
        self.stack.borrow_mut().push(context);
    }

    /// Removes and returns the current context.
    ///
    /// Popping an empty stack is a no-op and returns `None`.
    pub fn pop(&self) -> Option<ContextRef> {
        self.stack.borrow_mut().pop()
    }

    /// Returns the top of the stack, or the fallback context when empty.
    #[must_use]
    pub fn current(&self) -> ContextRef {
        self.stack
            .borrow()
            .last()
            .map_or_else(|| Rc::clone(&self.fallback), Rc::clone)
    }

    /// Number of pushed contexts.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Returns `true` if nothing is pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.borrow().is_empty()
    }

    /// Pushes `context` and returns a guard that restores the previous depth
    /// when dropped.
    #[must_use = "the context is popped as soon as the guard is dropped"]
    pub fn scoped(&self, context: ContextRef) -> ContextGuard<'_> {
        let depth = self.depth();
        self.push(Rc::clone(&context));
        ContextGuard {
            stack: self,
            depth,
            context,
        }
    }
}

/// Keeps a context current for the guard's lifetime.
///
/// Dropping the guard truncates the stack to the depth it had before the
/// push, which also discards anything pushed (and not popped) since.
pub struct ContextGuard<'a> {
    stack: &'a ContextStack,
    depth: usize,
    context: ContextRef,
}

impl fmt::Debug for ContextGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl ContextGuard<'_> {
    /// The context this guard pushed.
    #[must_use]
    pub fn context(&self) -> ContextRef {
        Rc::clone(&self.context)
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.stack.stack.borrow_mut().truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Size);

    impl Canvas for Fixed {
        fn size(&self) -> Size {
            self.0
        }
        fn save_state(&mut self) {}
        fn restore_state(&mut self) {}
        fn concat_transform(&mut self, _affine: Affine) {}
        fn clip_path(&mut self, _path: &BezPath) {}
        fn fill_path(&mut self, _path: &BezPath, _color: Rgba) {}
        fn stroke_path(&mut self, _path: &BezPath, _color: Rgba, _width: f64) {}
        fn draw_text(&mut self, _text: &str, _origin: Point, _style: &TextStyle) {}
    }

    fn sized(w: f64, h: f64) -> ContextRef {
        context_ref(Fixed(Size::new(w, h)))
    }

    #[test]
    fn push_then_pop_restores_previous() {
        let stack = ContextStack::new();
        let a = sized(1.0, 1.0);
        let b = sized(2.0, 2.0);
        stack.push(Rc::clone(&a));
        stack.push(Rc::clone(&b));
        assert!(Rc::ptr_eq(&stack.current(), &b));
        stack.pop();
        assert!(Rc::ptr_eq(&stack.current(), &a));
    }

    #[test]
    fn empty_stack_uses_fallback() {
        let stack = ContextStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.current().borrow().size(), Size::ZERO);
        assert!(stack.pop().is_none(), "pop on empty is a no-op");
        assert_eq!(stack.depth(), 0);
    }

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    impl Canvas for Log {
        fn size(&self) -> Size {
            Size::new(1.0, 1.0)
        }
        fn save_state(&mut self) {
            self.0.push("save");
        }
        fn restore_state(&mut self) {
            self.0.push("restore");
        }
        fn concat_transform(&mut self, _affine: Affine) {}
        fn clip_path(&mut self, _path: &BezPath) {}
        fn fill_path(&mut self, _path: &BezPath, _color: Rgba) {
            self.0.push("fill");
        }
        fn stroke_path(&mut self, _path: &BezPath, _color: Rgba, _width: f64) {}
        fn draw_text(&mut self, _text: &str, _origin: Point, _style: &TextStyle) {}
    }

    #[test]
    fn shared_handle_and_current_context_interleave() {
        let log = Rc::new(RefCell::new(Log::default()));
        let stack = ContextStack::new();
        let guard = stack.scoped(log.clone());

        let mut handle = guard.context();
        handle.save_state();
        stack.current().borrow_mut().fill_path(&BezPath::new(), Rgba::BLACK);
        assert_eq!(stack.current().borrow().size(), Size::new(1.0, 1.0));
        handle.restore_state();

        assert_eq!(log.borrow().0, vec!["save", "fill", "restore"]);
    }

    #[test]
    fn guard_pops_on_drop() {
        let stack = ContextStack::new();
        {
            let guard = stack.scoped(sized(5.0, 5.0));
            assert_eq!(stack.depth(), 1);
            assert!(Rc::ptr_eq(&stack.current(), &guard.context()));
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn guard_pops_on_early_error() {
        fn fails(stack: &ContextStack) -> Result<(), &'static str> {
            let _guard = stack.scoped(sized(5.0, 5.0));
            Err::<(), _>("boom")?;
            Ok(())
        }
        let stack = ContextStack::new();
        assert!(fails(&stack).is_err());
        assert!(stack.is_empty());
    }

    #[test]
    fn guard_discards_unbalanced_inner_pushes() {
        let stack = ContextStack::new();
        let outer = sized(1.0, 1.0);
        stack.push(Rc::clone(&outer));
        {
            let _guard = stack.scoped(sized(2.0, 2.0));
            stack.push(sized(3.0, 3.0));
        }
        assert_eq!(stack.depth(), 1);
        assert!(Rc::ptr_eq(&stack.current(), &outer));
    }
}
