/**
Prompt construction for the extraction model.

Every prompt asks for a single JSON object with the keys `person`, `organizations` and `address`,
which is the shape `parse_response` reads back.
*/
use crate::dataset::sampler::FewShotExample;
use crate::entity::EntityMap;
use crate::error::Error;
use std::fmt::Display;
use std::str::FromStr;

const SYSTEM_ROLE: &str = "You are an expert in Named Entity Recognition (NER) for Vietnamese text.";

const JSON_SHAPE: &str = r#"{"person": [], "organizations": [], "address": []}"#;

/// At most this many worked examples are shown.
pub const MAX_EXAMPLES: usize = 3;

/// Worked example inputs are cut to this many characters.
pub const MAX_EXAMPLE_CHARS: usize = 500;

const DEFAULT_INSTRUCTION: &str = "You are a Vietnamese Named Entity Recognition (NER) expert. \
Extract named entities from the given text and classify them into three categories:\n\
- person: Names of people\n\
- organizations: Names of organizations, companies, institutions\n\
- address: Location names, addresses\n\n\
Return your answer as a JSON object with these three keys. \
Each value should be a list of strings. \
If a category has no entities, return an empty list. \
Do not invent entities that are not present in the text.";

/// The prompt families used in the experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromptStyle {
    #[default]
    ZeroShot,
    FewShot,
    ChainOfThought,
    /// `### Instruction / ### Input / ### Response` layout for instruction-tuned models.
    Instruct,
}

impl Display for PromptStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            PromptStyle::ZeroShot => "zero_shot",
            PromptStyle::FewShot => "few_shot",
            PromptStyle::ChainOfThought => "cot",
            PromptStyle::Instruct => "instruct",
        };
        write!(f, "{}", str_content)
    }
}

impl FromStr for PromptStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "zero_shot" | "zeroshot" => Ok(PromptStyle::ZeroShot),
            "few_shot" | "fewshot" => Ok(PromptStyle::FewShot),
            "cot" | "chain_of_thought" => Ok(PromptStyle::ChainOfThought),
            "instruct" => Ok(PromptStyle::Instruct),
            _ => Err(Error::parse("PromptStyle", s)),
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn pretty_entities(map: &EntityMap) -> String {
    serde_json::to_string_pretty(map).unwrap_or_else(|_| String::from(JSON_SHAPE))
}

/// Renders the first `MAX_EXAMPLES` examples with the given labels.
fn render_examples(examples: &[FewShotExample], text_label: &str, output_label: &str) -> String {
    examples
        .iter()
        .take(MAX_EXAMPLES)
        .enumerate()
        .map(|(i, example)| {
            format!(
                "\nEXAMPLE {}:\n{}: {}\n{}:\n{}\n---\n",
                i + 1,
                text_label,
                truncate_chars(&example.input, MAX_EXAMPLE_CHARS),
                output_label,
                pretty_entities(&example.output)
            )
        })
        .collect()
}

pub fn zero_shot_prompt(text: &str) -> String {
    format!(
        "{SYSTEM_ROLE}

TASK: Extract ALL named entities that appear DIRECTLY in the text. Categorize them into 3 types:

1. PERSON (People names): full names (\"Nguyễn Văn A\"), titles + names (\"ông A\", \"chị Mai\"), \
stage names (\"Đức Phúc\"), character names and foreign names (\"Angela Merkel\").

2. ORGANIZATIONS (Institutions, companies, teams): government agencies (\"Bộ GD-ĐT\", \"UBND tỉnh\"), \
companies, schools (\"THCS Kỳ Thượng\"), sports teams (\"Hà Nội FC\", \"Quảng Nam\"), international \
organizations (\"FIFA\", \"VFF\") and media (\"VnExpress\").

3. ADDRESS (Locations, places): countries (\"Việt Nam\"), provinces and cities (\"tỉnh Hà Tĩnh\", \
\"TP.HCM\"), districts (\"quận 3\"), wards and communes (\"xã Kỳ Nam\") and specific places \
(\"sân Tam Kỳ\"). Keep prefixes such as \"tỉnh\", \"quận\", \"huyện\".

CRITICAL RULES:
- ONLY extract entities that appear DIRECTLY in the text (NO inference, NO translation)
- PRESERVE original spelling, accents, and capitalization
- List ALL alternate mentions of the same entity (\"Đức Phúc\" and \"Phúc\")
- Each entity appears ONCE per category
- If no entities are found, return an empty array []
- Remove trailing punctuation: \"ông A.\" becomes \"ông A\"

VIETNAMESE TEXT TO ANALYZE:
{text}

RETURN ONLY THIS JSON (no explanations, no markdown):
{JSON_SHAPE}
"
    )
}

/// Few-shot prompt. Without examples it falls back to the zero-shot prompt.
pub fn few_shot_prompt(text: &str, examples: &[FewShotExample]) -> String {
    if examples.is_empty() {
        return zero_shot_prompt(text);
    }
    let examples_text = render_examples(examples, "Vietnamese Text", "Extracted Entities");
    format!(
        "{SYSTEM_ROLE}

LEARN FROM THESE EXAMPLES showing correct Vietnamese entity extraction:
{examples_text}
KEY PATTERNS TO RECOGNIZE:
1. PERSON: Vietnamese names, foreign names, titles (ông/bà/anh/chị), stage names, character names
2. ORGANIZATIONS: agencies starting with \"Bộ\", \"UBND\", \"CTCP\"; schools with \"Trường\", \"THCS\", \
\"THPT\"; sports teams that appear as city names
3. ADDRESS: administrative prefixes \"tỉnh\", \"thành phố\", \"quận\", \"huyện\", \"xã\", \"phường\" \
are kept with the name

EXTRACTION RULES:
- Extract ONLY entities that appear DIRECTLY in the text
- PRESERVE original Vietnamese spelling with accents
- List ALL alternate mentions of the same entity separately
- Remove duplicates within each category

NOW EXTRACT ENTITIES FROM THIS NEW TEXT:
{text}

RETURN ONLY JSON (no explanations, no markdown):
{JSON_SHAPE}
"
    )
}

pub fn chain_of_thought_prompt(text: &str) -> String {
    format!(
        "{SYSTEM_ROLE}
Analyze this Vietnamese text step by step to extract all named entities.

VIETNAMESE TEXT:
{text}

STEP 1: Understand the context (news, sports, entertainment, politics, ...).
STEP 2: Find ALL PERSON entities: Vietnamese names, titles + names, names in quotes, foreign \
names, abbreviated mentions (\"Phúc\" if \"Đức Phúc\" appears), author credits after a dash or \
\"Theo\".
STEP 3: Find ALL ORGANIZATIONS: ministries (\"Bộ\"), \"UBND\", companies (\"CTCP\", \"Công ty\"), \
schools (\"Trường\", \"THCS\", \"THPT\"), sports teams, acronyms (WHO, FIFA, VFF), media.
STEP 4: Find ALL ADDRESS entities, keeping administrative prefixes: \"tỉnh\", \"thành phố\", \
\"TP\", \"quận\", \"huyện\", \"thị xã\", \"phường\", \"xã\", countries and specific places.
STEP 5: Clean and deduplicate: remove exact duplicates, keep the original spelling, remove \
trailing punctuation, do NOT infer or translate entities.

RETURN ONLY THE FINAL JSON RESULT (no explanations, no markdown):
{JSON_SHAPE}
"
    )
}

/// Instruction-tuned layout. `None` uses the default extraction instruction.
///
/// ```rust
/// use vner_eval::prompt::instruct_prompt;
///
/// let prompt = instruct_prompt("Ông A ở Hà Nội.", Some("Extract entities."));
/// assert_eq!(
///     prompt,
///     "### Instruction:\nExtract entities.\n\n### Input:\nÔng A ở Hà Nội.\n\n### Response:"
/// );
/// ```
pub fn instruct_prompt(text: &str, instruction: Option<&str>) -> String {
    let instruction = instruction.unwrap_or(DEFAULT_INSTRUCTION);
    format!("### Instruction:\n{instruction}\n\n### Input:\n{text}\n\n### Response:")
}

/// Builds the prompt of the given style. Examples are only used by the few-shot style.
pub fn build_prompt(style: PromptStyle, text: &str, examples: &[FewShotExample]) -> String {
    match style {
        PromptStyle::ZeroShot => zero_shot_prompt(text),
        PromptStyle::FewShot => few_shot_prompt(text, examples),
        PromptStyle::ChainOfThought => chain_of_thought_prompt(text),
        PromptStyle::Instruct => instruct_prompt(text, None),
    }
}

/// A prompt assembled from optional parts: an instruction, worked examples and a list of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomPrompt {
    instruction: Option<String>,
    examples: Vec<FewShotExample>,
    rules: Vec<String>,
}

impl CustomPrompt {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
    pub fn examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.examples = examples;
        self
    }
    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn render(&self, text: &str) -> String {
        let mut prompt = format!("{SYSTEM_ROLE}\n");
        if let Some(instruction) = self.instruction.as_deref().filter(|i| !i.is_empty()) {
            prompt.push_str(instruction);
            prompt.push('\n');
        }
        if !self.examples.is_empty() {
            prompt.push_str("\nLEARN FROM THESE EXAMPLES:\n");
            prompt.push_str(&render_examples(&self.examples, "Text", "Entities"));
        }
        if !self.rules.is_empty() {
            prompt.push_str("\nEXTRACTION RULES:\n");
            for rule in self.rules.iter() {
                prompt.push_str(&format!("- {}\n", rule));
            }
        }
        prompt.push_str(&format!("\nVIETNAMESE TEXT:\n{}\n", text));
        prompt.push_str(&format!("\nRETURN ONLY JSON:\n{}\n", JSON_SHAPE));
        prompt
    }
}
