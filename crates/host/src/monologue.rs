// crates/host/src/monologue.rs

//! The reflect → plan → implement dialogue that proposes new tools.

use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use toolsmith_core::ai_client::AiClient;
use toolsmith_core::ingest::{extract_code, parse_generated_tool, parse_json_object, parse_yaml_object};
use toolsmith_core::memory::{timestamp, ReflectionMemory};
use toolsmith_core::pipeline::{Candidate, Rejection, SynthesisOutcome, Synthesizer};
use toolsmith_core::tool_registry::ToolRegistry;

use crate::generator::{format_failures, ModelGenerator};
use crate::prompts;

const REFLECT_TEMPERATURE: f32 = 0.7;
const PLAN_TEMPERATURE: f32 = 0.5;
const CODE_TEMPERATURE: f32 = 0.2;
const SUMMARY_TEMPERATURE: f32 = 0.5;
const TOOL_USE_TEMPERATURE: f32 = 0.2;

/// Drives one improvement cycle against a model.
pub struct Monologue<'a, C: AiClient> {
    client: &'a C,
    synthesizer: Synthesizer,
}

fn tool_descriptions(registry: &ToolRegistry) -> String {
    let docs: Map<String, Value> = registry
        .list()
        .into_iter()
        .map(|name| {
            let doc = registry.doc(&name).map_or(Value::Null, |d| json!(d));
            (name, doc)
        })
        .collect();
    serde_json::to_string_pretty(&docs).unwrap_or_default()
}

/// Run every `{name, args}` entry of a tool plan. A single non-list `args`
/// value is passed as the only argument.
fn run_tool_calls(registry: &ToolRegistry, calls: &[Value]) -> Vec<Value> {
    calls
        .iter()
        .map(|call| {
            let name = text_field(call, "name");
            let args = match call.get("args") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(other) => vec![other.clone()],
            };
            match registry.execute_json(name, &args) {
                Ok(output) => json!({ "name": name, "output": output }),
                Err(err) => {
                    warn!(tool = name, error = %err, "planned tool call failed");
                    json!({ "name": name, "error": err.to_string() })
                }
            }
        })
        .collect()
}

fn text_field<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn pretty_field(value: &Value, key: &str, default: Value) -> String {
    let field = value.get(key).cloned().unwrap_or(default);
    serde_json::to_string_pretty(&field).unwrap_or_default()
}

/// Category used when a plan does not name one.
pub fn fallback_category(tool_name: &str) -> &'static str {
    let name = tool_name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| name.contains(w));
    if has(&["string", "text", "str"]) {
        "string manipulation"
    } else if has(&["math", "calc", "sum"]) {
        "mathematical operations"
    } else if has(&["file", "read", "write"]) {
        "file operations"
    } else if has(&["data", "list", "array"]) {
        "data processing"
    } else {
        "utility functions"
    }
}

fn log_rejection(tool: &str, rejection: &Rejection) {
    match rejection {
        Rejection::Extraction(err) => warn!(tool, error = %err, "candidate rejected: could not load"),
        Rejection::Validation { errors } => {
            warn!(tool, failures = %format_failures(errors), "candidate rejected: failed validation")
        }
        Rejection::NotNovel { name } => {
            warn!(tool, resolved = %name, "candidate rejected: similar tool already exists")
        }
        Rejection::Admission(err) => warn!(tool, error = %err, "candidate rejected: could not be stored"),
    }
}

impl<'a, C: AiClient> Monologue<'a, C> {
    pub fn new(client: &'a C, synthesizer: Synthesizer) -> Self {
        Self {
            client,
            synthesizer,
        }
    }

    fn submit(&self, registry: &mut ToolRegistry, candidate: &Candidate) -> Option<String> {
        let generator = ModelGenerator::new(self.client);
        match self
            .synthesizer
            .synthesize_candidate(registry, candidate, &generator)
        {
            SynthesisOutcome::Admitted { name, repaired } => {
                info!(tool = %name, repaired, "implemented tool");
                Some(name)
            }
            SynthesisOutcome::Rejected(rejection) => {
                log_rejection(&candidate.name, &rejection);
                None
            }
        }
    }

    /// Ask the model to assess the toolkit. The reflection is recorded in
    /// `memory`; a reply that is not JSON is kept verbatim.
    pub fn reflect(&self, registry: &ToolRegistry, memory: &mut ReflectionMemory) -> Value {
        let previous = if memory.is_empty() {
            "No previous thoughts.".to_string()
        } else {
            serde_json::to_string_pretty(memory.recent(3)).unwrap_or_default()
        };
        let prompt = prompts::reflect_prompt(registry.len(), &tool_descriptions(registry), &previous);

        let content = match self
            .client
            .complete(prompts::REFLECT_SYSTEM, &prompt, REFLECT_TEMPERATURE)
        {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "reflection request failed");
                return json!({
                    "error": err.to_string(),
                    "internal_monologue": "I encountered an error while trying to reflect on my state.",
                    "timestamp": timestamp(),
                });
            }
        };

        let snapshot = match parse_json_object(&content) {
            Some(Value::Object(map)) => map,
            _ => {
                warn!("failed to parse reflection as JSON, storing raw text");
                let mut map = Map::new();
                map.insert("strengths".into(), json!(["Unable to parse full reflection"]));
                map.insert("weaknesses".into(), json!(["JSON parsing error"]));
                map.insert("internal_monologue".into(), json!(content));
                map
            }
        };

        match memory.record(snapshot.clone()) {
            Ok(stored) => stored,
            Err(err) => {
                error!(error = %err, "failed to save reflection");
                let mut snapshot = snapshot;
                snapshot.insert("timestamp".into(), json!(timestamp()));
                Value::Object(snapshot)
            }
        }
    }

    /// Turn the reflection's recommendation into a concrete plan.
    pub fn plan(&self, registry: &ToolRegistry, reflection: &Value) -> Value {
        let next = reflection
            .get("next_tool_recommendation")
            .cloned()
            .unwrap_or(Value::Null);
        let name = text_field(&next, "name");
        let purpose = text_field(&next, "purpose");
        let category = text_field(&next, "category");
        let prompt = prompts::plan_prompt(name, purpose, category, &tool_descriptions(registry));

        let content = match self
            .client
            .complete(prompts::PLAN_SYSTEM, &prompt, PLAN_TEMPERATURE)
        {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "planning request failed");
                return json!({ "error": err.to_string() });
            }
        };

        if let Some(plan) = parse_json_object(&content) {
            return plan;
        }

        let tool_name = if name.is_empty() { "unnamed_tool" } else { name };
        let mut plan = json!({
            "tool_name": tool_name,
            "description": purpose,
            "raw_response": content,
        });
        if let Some(code) = extract_code(&content) {
            plan["code_template"] = json!(code);
        }
        plan
    }

    /// Build the planned tool: its code template first, then freshly
    /// generated code, then a new tool in the plan's category.
    pub fn implement(&self, registry: &mut ToolRegistry, plan: &Value) -> Option<String> {
        let tool_name = text_field(plan, "tool_name");
        let fallback_name = if tool_name.is_empty() { "unnamed_tool" } else { tool_name };

        let template = text_field(plan, "code_template");
        if let Ok(candidate) = parse_generated_tool(template, fallback_name) {
            info!(tool = %candidate.name, "implementing planned tool from template");
            if let Some(name) = self.submit(registry, &candidate) {
                return Some(name);
            }
        }

        let category = match text_field(plan, "category") {
            "" => fallback_category(tool_name),
            category => category,
        };

        let prompt = prompts::implement_prompt(
            tool_name,
            text_field(plan, "description"),
            &pretty_field(plan, "inputs", json!([])),
            &pretty_field(plan, "output", json!({})),
            &pretty_field(plan, "edge_cases", json!([])),
            &pretty_field(plan, "implementation_steps", json!([])),
        );
        let content = match self
            .client
            .complete(prompts::IMPLEMENT_SYSTEM, &prompt, CODE_TEMPERATURE)
        {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "implementation request failed");
                return None;
            }
        };

        let candidate = match parse_generated_tool(&content, fallback_name) {
            Ok(candidate) => candidate,
            Err(err) => {
                error!(error = %err, "could not extract tool code from model reply");
                return None;
            }
        };
        if let Some(name) = self.submit(registry, &candidate) {
            return Some(name);
        }

        warn!(tool = fallback_name, category, "planned tool failed, creating a new tool in its category");
        self.create_new_tool(registry, category)
    }

    /// Ask for any useful tool in `category`.
    pub fn create_new_tool(&self, registry: &mut ToolRegistry, category: &str) -> Option<String> {
        let existing = registry
            .sources()
            .map(|(name, source)| format!("Tool '{name}':\n{source}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = prompts::create_prompt(&existing, category);

        let content = match self
            .client
            .complete(prompts::CREATE_SYSTEM, &prompt, CODE_TEMPERATURE)
        {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "tool creation request failed");
                return None;
            }
        };
        match parse_generated_tool(&content, "new_tool") {
            Ok(candidate) => self.submit(registry, &candidate),
            Err(err) => {
                error!(error = %err, "invalid tool creation reply");
                None
            }
        }
    }

    pub fn summarize_capabilities(&self, registry: &ToolRegistry) -> String {
        let prompt = prompts::summary_prompt(&tool_descriptions(registry));
        match self
            .client
            .complete(prompts::SUMMARY_SYSTEM, &prompt, SUMMARY_TEMPERATURE)
        {
            Ok(summary) => summary,
            Err(err) => {
                error!(error = %err, "capability summary request failed");
                format!("Error generating summary: {err}")
            }
        }
    }

    /// Ask the model how to solve `task` with the registered tools (or the
    /// `available` subset) and run the calls it proposes. The parsed plan
    /// comes back with a `results` entry per call; failures come back as
    /// `{"error": ...}`.
    pub fn use_tools(
        &self,
        registry: &ToolRegistry,
        task: &str,
        available: Option<&[String]>,
    ) -> Value {
        let names = available.map_or_else(|| registry.list(), <[String]>::to_vec);
        let descriptions = names
            .iter()
            .filter_map(|name| {
                let tool = registry.tool(name)?;
                let doc = tool.callable.doc().unwrap_or("No description");
                Some(format!("Tool '{}': {doc}", tool.name))
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = prompts::use_tools_prompt(task, &descriptions);

        let content = match self
            .client
            .complete(prompts::USE_TOOLS_SYSTEM, &prompt, TOOL_USE_TEMPERATURE)
        {
            Ok(content) => content,
            Err(err) => {
                error!(error = %err, "tool use request failed");
                return json!({ "error": err.to_string() });
            }
        };

        let Some(mut plan) = parse_yaml_object(&content) else {
            warn!("failed to parse tool plan as YAML");
            return json!({ "error": "could not parse tool plan", "raw_response": content });
        };
        let calls = plan
            .get("tools_used")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let results = run_tool_calls(registry, &calls);
        info!(task, calls = results.len(), "executed tool plan");
        if let Value::Object(map) = &mut plan {
            map.insert("results".into(), Value::Array(results));
        }
        plan
    }

    /// One full cycle. Returns the admitted tool's name.
    pub fn improve(
        &self,
        registry: &mut ToolRegistry,
        memory: &mut ReflectionMemory,
    ) -> Option<String> {
        info!("starting self-improvement with reflection");
        let reflection = self.reflect(registry, memory);
        info!(
            priority = text_field(&reflection, "improvement_priority"),
            "reflection complete"
        );

        let plan = self.plan(registry, &reflection);
        info!(tool = text_field(&plan, "tool_name"), "planning complete");

        let result = self.implement(registry, &plan);
        match &result {
            Some(name) => info!(tool = %name, "implemented new tool through reflection"),
            None => warn!("failed to implement tool through reflection"),
        }
        result
    }
}
