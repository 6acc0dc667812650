//! Preview output clip names.

use audiosweet_processing_core::{NamingState, OutputNamer};

pub fn run(name: String, tokens: Vec<String>, cap: usize) -> anyhow::Result<()> {
    let state = NamingState::parse(&name);
    println!("Base: {}", state.base);
    println!("Version: {}", state.version);
    if !state.tokens.is_empty() {
        println!("Tokens: {}", state.tokens.join(", "));
    }

    let output = OutputNamer::new(cap).apply(&name, &tokens);
    println!("\n{output}");
    Ok(())
}
