//! Programs and kernels.

use std::sync::{Arc, Weak};

use opal_backend::{Backend, PeerHandle};

use crate::context::{Context, ContextInner};
use crate::error::{Error, Result};
use crate::resource::{HandleGuard, Resource};

/// The native handle of a built program.
///
/// Arc'd so kernels can hold a non-owning reference to it; released when
/// the owning [`Program`] drops.
pub(crate) struct BuiltProgram {
    guard: HandleGuard,
}

impl BuiltProgram {
    fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }
}

/// A compute program: source fragments, then a build, then kernels.
///
/// State machine: a program starts empty, accumulates sources with
/// [`add_source`](Program::add_source), and transitions to built with
/// [`build`](Program::build). Kernels can only be extracted after build;
/// adding sources after build is rejected.
pub struct Program {
    context: Weak<ContextInner>,
    sources: Vec<String>,
    built: Option<Arc<BuiltProgram>>,
}

impl Program {
    pub(crate) fn new(context: Weak<ContextInner>) -> Self {
        Self {
            context,
            sources: Vec::new(),
            built: None,
        }
    }

    /// Appends a source fragment.
    ///
    /// Fails with [`Error::AlreadyBuilt`] once the program is built.
    pub fn add_source(&mut self, source: impl Into<String>) -> Result<()> {
        if self.built.is_some() {
            return Err(Error::AlreadyBuilt);
        }
        self.sources.push(source.into());
        Ok(())
    }

    /// Number of attached source fragments.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether [`build`](Program::build) has succeeded.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Compiles the attached sources into a native program.
    ///
    /// Exactly one backend call; on failure the program stays unbuilt and
    /// sources can still be added.
    pub fn build(&mut self) -> Result<()> {
        if self.built.is_some() {
            return Err(Error::AlreadyBuilt);
        }
        if self.sources.is_empty() {
            return Err(Error::NoSources);
        }
        let context = self.context.upgrade().ok_or(Error::ContextReleased)?;
        let backend = context.backend();
        let handle = backend.program_handle(context.handle(), &self.sources)?;
        self.built = Some(Arc::new(BuiltProgram {
            guard: HandleGuard::new(backend.clone(), handle),
        }));
        Ok(())
    }

    /// Extracts a kernel by name from the built program.
    pub fn create_kernel(&self, name: &str) -> Result<Kernel> {
        let built = self.built.as_ref().ok_or(Error::NotBuilt)?;
        let context = self.context.upgrade().ok_or(Error::ContextReleased)?;
        let backend = context.backend();
        let handle = backend.kernel_handle(built.handle(), name)?;
        Ok(Kernel {
            program: Arc::downgrade(built),
            name: name.to_string(),
            guard: HandleGuard::new(backend.clone(), handle),
        })
    }

    /// The owning context, if it is still alive.
    pub fn context(&self) -> Option<Context> {
        self.context.upgrade().map(Context::from_inner)
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("sources", &self.sources.len())
            .field("built", &self.built.is_some())
            .finish()
    }
}

/// A kernel extracted from a built program.
///
/// Holds a non-owning back-reference to the program's native handle: a
/// kernel must not be used once its program is dropped, and
/// [`program_handle`](Kernel::program_handle) turning `None` makes that
/// observable.
pub struct Kernel {
    program: Weak<BuiltProgram>,
    name: String,
    guard: HandleGuard,
}

impl Kernel {
    /// The kernel's name in the program source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The native handle of the owning program, if it is still alive.
    pub fn program_handle(&self) -> Option<PeerHandle> {
        self.program.upgrade().map(|p| p.handle())
    }
}

impl Resource for Kernel {
    fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        self.guard.backend()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("handle", &self.guard.handle())
            .finish()
    }
}
