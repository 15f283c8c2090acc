use std::{fmt, ops::Deref};

use super::{Context, RendererId, WindowId};
use crate::Result;

/// A handle type whose native resource is released through [`Context`].
pub trait Resource: Copy + fmt::Debug {
    fn destroy(self, ctx: &Context) -> Result<()>;

    /// Whether the handle was already released as a side effect of
    /// releasing its parent.
    fn released_by_cascade(self, _ctx: &Context) -> bool {
        false
    }
}

impl Resource for WindowId {
    fn destroy(self, ctx: &Context) -> Result<()> {
        ctx.destroy_window(self)
    }
}

impl Resource for RendererId {
    fn destroy(self, ctx: &Context) -> Result<()> {
        ctx.destroy_renderer(self)
    }

    fn released_by_cascade(self, ctx: &Context) -> bool {
        ctx.take_cascaded(self)
    }
}

/// Scoped ownership of a handle: the resource is released when the guard
/// goes out of scope, on every exit path.
///
/// A renderer already released because its window was destroyed first is
/// skipped. Any other handle released behind the guard's back is a double
/// release and is reported through the context's [`crate::LifetimePolicy`].
pub struct Owned<'ctx, H: Resource> {
    ctx: &'ctx Context,
    handle: H,
    armed: bool,
}

impl<'ctx, H: Resource> Owned<'ctx, H> {
    pub(crate) fn new(ctx: &'ctx Context, handle: H) -> Self {
        Self {
            ctx,
            handle,
            armed: true,
        }
    }

    /// Gives up scoped ownership; the caller must release the handle.
    pub fn into_inner(mut self) -> H {
        self.armed = false;
        self.handle
    }

    /// Releases now, reporting any failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        if self.handle.released_by_cascade(self.ctx) {
            return Ok(());
        }
        self.handle.destroy(self.ctx)
    }
}

impl<H: Resource> Deref for Owned<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: Resource> Drop for Owned<'_, H> {
    fn drop(&mut self) {
        if !self.armed || self.handle.released_by_cascade(self.ctx) {
            return;
        }
        if let Err(err) = self.handle.destroy(self.ctx) {
            tracing::warn!(handle = ?self.handle, error = %err, "scoped release failed");
        }
    }
}

impl<H: Resource> fmt::Debug for Owned<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("handle", &self.handle)
            .field("armed", &self.armed)
            .finish()
    }
}
