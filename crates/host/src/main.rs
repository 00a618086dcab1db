mod config;
mod docs;
mod generator;
mod monologue;
mod prompts;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolsmith_core::harness::Harness;
use toolsmith_core::memory::ReflectionMemory;
use toolsmith_core::openai_client::OpenAiClient;
use toolsmith_core::pipeline::Synthesizer;
use toolsmith_core::tool_registry::ToolRegistry;

use config::HostConfig;
use monologue::Monologue;

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toolsmith=info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

fn print_summary(title: &str, summary: &str) {
    println!("\n=== {title} ===");
    println!("{summary}");
    println!("===========================\n");
}

fn export_docs(registry: &ToolRegistry, config: &HostConfig) {
    if let Err(e) = docs::export_documentation(registry, &config.docs_file) {
        error!(error = %e, "failed to export tools documentation");
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = HostConfig::from_env()?;
    init_tracing(config.log_json);

    let client = OpenAiClient::new(&config.base_url, &config.model, &config.api_key);
    let mut registry = ToolRegistry::open(&config.tools_file).with_limits(config.limits);
    let mut memory = ReflectionMemory::load(&config.memory_file);
    let monologue = Monologue::new(&client, Synthesizer::new(Harness::new(config.limits)));

    let tools = registry.list();
    info!(count = tools.len(), model = client.model(), "loaded tools");
    println!("\nLoaded {} tools from {}:", tools.len(), config.tools_file.display());
    for tool in &tools {
        println!("- {tool}");
    }

    if let Some(task) = &config.task {
        let plan = monologue.use_tools(&registry, task, None);
        println!("\n=== Task ===\n{task}\n");
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    export_docs(&registry, &config);
    print_summary("Current Capabilities", &monologue.summarize_capabilities(&registry));

    let mut cycle: u64 = 0;
    loop {
        if config.max_cycles.is_some_and(|max| cycle >= max) {
            info!(cycles = cycle, "reached cycle limit");
            break;
        }
        cycle += 1;
        info!(cycle, "starting self-improvement cycle");
        println!("\n--- Starting Self-Improvement Cycle {cycle} ---");

        let new_tool = monologue.improve(&mut registry, &mut memory);
        match &new_tool {
            Some(name) => {
                info!(tool = %name, toolkit_size = registry.len(), "added new tool");
                println!("\nNew Tool Added ({name}):");
                println!("{}", registry.get_source(name).unwrap_or_default());
                export_docs(&registry, &config);
                if cycle % 3 == 0 {
                    print_summary("Updated Capabilities", &monologue.summarize_capabilities(&registry));
                }
            }
            None => {
                warn!(cycle, "failed to create a new tool in this cycle");
                if cycle % 5 == 0 {
                    export_docs(&registry, &config);
                    print_summary("Current Capabilities", &monologue.summarize_capabilities(&registry));
                }
            }
        }

        if config.max_cycles.is_some_and(|max| cycle >= max) {
            continue;
        }
        let pause = if new_tool.is_some() {
            config.sleep_after_success
        } else {
            config.sleep_after_failure
        };
        println!("\nWaiting {} seconds before next cycle...\n", pause.as_secs());
        std::thread::sleep(pause);
    }

    Ok(())
}
