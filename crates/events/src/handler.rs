/// Execute an aggregate command in place (no IO, no persistence).
///
/// The canonical decide-then-evolve step:
///
/// 1. **Decide**: `aggregate.handle(command)` checks every precondition and
///    returns the events (no mutation).
/// 2. **Evolve**: each event is applied via `aggregate.apply(event)`.
///
/// If `handle` fails nothing is applied, so the aggregate is untouched.
///
/// Useful for domain tests and inline processing. The full pipeline with
/// persistence and publication is `CommandDispatcher::dispatch()` in infra.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: mintledger_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
