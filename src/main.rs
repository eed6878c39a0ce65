use lazeline::{Pipeline, PipelineError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Per-element interleaving up to `sorted`, then sorted order:
    // c2, C2, c1, C1, C1Hai, C2Hai
    Pipeline::new(["a1", "a2", "b1", "c2", "c1"])
        .filter(|s| s.starts_with('c'))
        .peek(|s| println!("{s}"))
        .map(str::to_uppercase)
        .peek(|s| println!("{s}"))
        .sorted()
        .map(|s| s + "Hai")
        .for_each(|s| println!("{s}"))
}
