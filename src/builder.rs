//! Instance builder: constructor selection and dependency satisfaction.

use tracing::trace;

use crate::error::DiResult;
use crate::implementation::{Argument, Arguments, Dependency, Implementation};
use crate::internal::ConstructionFrame;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// Constructs one instance of `implementation` for the key on top of `frame`.
///
/// Dependencies are resolved in declared order below `frame`; the first
/// failure aborts the construction before the constructor runs.
pub(crate) fn build(provider: &ServiceProvider, implementation: &Implementation, frame: &ConstructionFrame<'_>) -> DiResult<AnyArc> {
    let constructor = implementation.select_constructor(|dependency| provider.can_resolve(dependency))?;
    trace!(
        service = %frame.key(),
        implementation = %implementation.key(),
        parameters = constructor.parameters().len(),
        "constructing"
    );

    let ctx = ResolverContext::new(provider, frame);
    let mut values = Vec::with_capacity(constructor.parameters().len());
    for dependency in constructor.parameters() {
        let value = match dependency {
            Dependency::Service(key) => Argument::Single(ctx.resolve(key)?),
            Dependency::Collection(key) => Argument::Many(ctx.resolve_all(key)?),
        };
        values.push(value);
    }

    constructor.invoke(&ctx, &Arguments::new(values))
}
