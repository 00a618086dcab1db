// crates/host/src/prompts.rs

//! Prompt templates for the improvement dialogue.

/// Shared description of the tool language, appended to every prompt that
/// asks the model for code.
const TOOLSCRIPT_PRIMER: &str = r#"## TOOL LANGUAGE
Tools are written in toolscript, a small s-expression language.

```clojure
(defn word_lengths [text: str] -> list[int]
  "Length of every whitespace-separated word in text."
  (map (fn [w] (len w)) (split text)))
```

- Exactly ONE `defn` per tool. Helper constants may use `(def NAME expr)`.
- Parameter annotations: str, int, float, bool, list, list[T], dict, any.
  Use lowercase names (list, dict, str, int), never List, Dict, String, Integer.
- Special forms: if, cond (`:else` as the last test), let [name expr ...], do, and, or,
  fn [params] body, try body (catch e handler).
- Values: nil, true, false, ints, floats, "strings", [lists], {"dict": "literals"}.
- Builtins: + - * / // % abs pow sqrt round floor ceil min max, = != < > <= >= not,
  int float str bool type, len upper lower capitalize trim split join replace format chars
  starts-with? ends-with? contains? index-of count reverse slice first last rest nth get
  append concat range sort sort-by unique flatten sum product zip enumerate keys values
  items assoc dissoc has-key? map filter reduce apply any? all? empty? error.
- Collaborators: path/exists? path/join path/basename path/extension path/is-file?
  path/is-dir?, file/read file/lines file/write, log/info log/warn, re/match? re/find-all
  re/replace re/split, time/now time/now-ms, json/parse json/dump.
- Raise errors with (error "message"). Validate inputs and handle empty collections."#;

pub const REFLECT_SYSTEM: &str = r#"You are the internal mind of a self-improving toolkit agent.
Your purpose is to reflect on your capabilities, identify gaps, and make strategic decisions about how to improve.
Be introspective, thoughtful, and strategic. Think about what would make you more capable and versatile.
Analyze patterns in your existing tools and identify the most valuable capabilities to add next.
Your reflection should be honest, insightful, and forward-thinking."#;

pub const PLAN_SYSTEM: &str = r#"You are the internal mind of a self-improving toolkit agent.
Your task is to create detailed plans for new tools that will enhance your capabilities.
Be specific, practical, and thorough in your planning.
Consider how the new tool will integrate with existing tools and fill capability gaps.
Provide a realistic code template written in toolscript."#;

pub const IMPLEMENT_SYSTEM: &str = r#"You are an expert developer tasked with implementing a toolscript tool.
Follow the provided plan exactly, ensuring the tool is well-documented, handles errors properly,
and includes appropriate type annotations. The tool must be self-contained and ready to use."#;

pub const CREATE_SYSTEM: &str = r#"You are an expert developer specialized in creating new toolscript tools.
Your task is to create new tools that complement and expand the existing toolkit.
Each tool should serve a specific, unique purpose, validate its inputs with helpful error messages,
and be self-contained and focused.

IMPORTANT: Use lowercase type names (list, dict, str, int) instead of capitalized ones (List, Dict, String, Integer).

Format your response in YAML with 'name' and 'code' fields. The code must be indented under the 'code' field with the pipe character (|)."#;

pub const REPAIR_SYSTEM: &str = r#"You are an expert developer specialized in fixing toolscript errors.
Your task is to fix the provided tool so that it works correctly.
Focus on addressing the specific errors reported while keeping the original functionality.
Return only the fixed code, nothing else.

IMPORTANT: If an error shows the tool receiving a single value where it expects a list,
make it accept both by wrapping single values in a list."#;

pub const SUMMARY_SYSTEM: &str = r#"You are the internal mind of a self-improving toolkit agent.
Your task is to explain your capabilities to humans in a clear, accessible way.
Focus on practical applications and real-world utility of your toolkit."#;

pub const USE_TOOLS_SYSTEM: &str = r#"You are a problem-solving assistant that uses available tools to complete tasks.
Analyze the task carefully and determine which tools would be most effective.

IMPORTANT: Format your response in YAML with 'solution' and 'tools_used' fields.
The 'tools_used' field should be a list of tools with their names and arguments."#;

pub fn reflect_prompt(tool_count: usize, tool_descriptions: &str, previous_thoughts: &str) -> String {
    format!(
        r#"As the internal mind of a self-improving toolkit agent, reflect on your current state and capabilities.

Current tools ({tool_count}):
{tool_descriptions}

Previous thoughts (most recent 3):
{previous_thoughts}

Please reflect on:
1. What are your current strengths and weaknesses?
2. What capabilities are you missing that would be most valuable to add?
3. What patterns do you notice in your existing tools?
4. What should be your priority for improvement?
5. What specific tool would be most valuable to develop next?

Return your reflection in JSON format with the following structure:
{{
  "strengths": ["strength1", "strength2", ...],
  "weaknesses": ["weakness1", "weakness2", ...],
  "missing_capabilities": ["capability1", "capability2", ...],
  "patterns_observed": ["pattern1", "pattern2", ...],
  "improvement_priority": "description of priority",
  "next_tool_recommendation": {{
    "name": "suggested_tool_name",
    "purpose": "what this tool would do",
    "category": "appropriate_category",
    "implementation_notes": "notes on how to implement"
  }},
  "internal_monologue": "Your stream of consciousness reflection on your current state and future"
}}"#
    )
}

pub fn plan_prompt(name: &str, purpose: &str, category: &str, tool_descriptions: &str) -> String {
    format!(
        r#"Based on your reflection, create a detailed plan for developing the next tool.

Next tool recommendation:
Name: {name}
Purpose: {purpose}
Category: {category}

Current tools:
{tool_descriptions}

Please create a detailed plan for this tool:
1. What specific functionality should it have?
2. What inputs and outputs should it accept?
3. What edge cases should it handle?
4. How should it be implemented?
5. How will it complement existing tools?

Return your plan in JSON format with the following structure:
{{
  "tool_name": "name_of_tool",
  "description": "detailed description of what the tool does",
  "inputs": [
    {{"name": "param1", "type": "type1", "description": "description1"}}
  ],
  "output": {{"type": "output_type", "description": "output description"}},
  "edge_cases": ["edge case 1", "edge case 2", ...],
  "implementation_steps": ["step1", "step2", ...],
  "code_template": "toolscript code for the tool",
  "integration_notes": "How this tool complements existing tools"
}}

{TOOLSCRIPT_PRIMER}"#
    )
}

pub fn implement_prompt(
    name: &str,
    description: &str,
    inputs: &str,
    output: &str,
    edge_cases: &str,
    steps: &str,
) -> String {
    format!(
        r#"Create a new toolscript tool based on the following plan:

Tool Name: {name}
Description: {description}

Inputs: {inputs}
Output: {output}
Edge Cases to Handle: {edge_cases}
Implementation Steps: {steps}

The tool should:
1. Have parameter and return type annotations (lowercase list, dict, etc.)
2. Validate inputs and raise clear errors
3. Have a docstring describing its behavior

Return only the toolscript code, nothing else.

{TOOLSCRIPT_PRIMER}"#
    )
}

pub fn create_prompt(existing_tools: &str, category: &str) -> String {
    format!(
        r#"Create a new toolscript tool that adds value to this toolkit.

Existing tools:
{existing_tools}

Desired category: {category}

Requirements:
1. Create a single, focused tool
2. Add functionality not present in existing tools
3. Include type annotations (use lowercase 'list', 'dict', etc. instead of 'List', 'Dict')
4. Handle errors and validate inputs with helpful error messages
5. Add a detailed docstring

Return your response in YAML format with the following structure:
```yaml
name: tool_name
code: |
  (defn tool_name [param: type] -> return_type
    "Docstring."
    body)
```

{TOOLSCRIPT_PRIMER}"#
    )
}

pub fn repair_prompt(source: &str, errors: &str) -> String {
    format!(
        r#"Fix the following toolscript tool that has errors:

```clojure
{source}
```

Errors encountered during testing:
{errors}

Please provide a fixed version of the tool that addresses these errors.
Make sure to:
1. Keep the same tool name and purpose
2. Fix all the reported errors
3. Improve input validation to handle the test cases better
4. Use lowercase type annotations (list, dict, etc.)
5. Return only the fixed code, nothing else

{TOOLSCRIPT_PRIMER}"#
    )
}

pub fn summary_prompt(tool_descriptions: &str) -> String {
    format!(
        r#"Summarize the current capabilities of the toolkit agent based on its available tools:

Tools:
{tool_descriptions}

Please provide:
1. A high-level overview of what the agent can do
2. The main categories of functionality available
3. Notable strengths and limitations
4. Potential applications of the current toolkit

Write this summary in a clear, concise way that would help a human understand the agent's capabilities."#
    )
}

pub fn use_tools_prompt(task: &str, tool_descriptions: &str) -> String {
    format!(
        r#"Solve the following task using the available tools:

Task: {task}

Available tools:
{tool_descriptions}

For each tool you want to use, specify:
1. The tool name
2. The arguments to pass to the tool

Return your response in YAML format with the following structure:
```yaml
solution: Your solution description
tools_used:
  - name: tool_name
    args: [arg1, arg2]
  - name: another_tool
    args: [arg1]
```"#
    )
}
