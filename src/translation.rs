//! AI-assisted content translation.
//!
//! Meal names, ingredient names and cooking instructions are generated in
//! English; other display languages are produced by batching the distinct
//! text fragments into one prompt per content kind and asking an external
//! LLM endpoint for a JSON mapping of original to translated text.
//!
//! Translation is strictly best-effort: a malformed response, a missing
//! fragment or a network failure degrades to showing the original English
//! text. Nothing in this module can fail the caller.
//!
//! Successful translations land in an injectable [`TranslationCache`] keyed
//! by (content, kind, language). The cache is append-only for the life of
//! the process; `clear` exists for test isolation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::MealPlan;

/// Fragments sent per translation request.
const CHUNK_SIZE: usize = 30;

/// Display languages the product ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
    Fr,
    Es,
    It,
    Pt,
    Nl,
    Pl,
    Ro,
    Cs,
}

impl Language {
    /// Parse a two-letter language code.
    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            "fr" => Some(Language::Fr),
            "es" => Some(Language::Es),
            "it" => Some(Language::It),
            "pt" => Some(Language::Pt),
            "nl" => Some(Language::Nl),
            "pl" => Some(Language::Pl),
            "ro" => Some(Language::Ro),
            "cs" => Some(Language::Cs),
            _ => None,
        }
    }

    /// English name of the language, as used in prompts.
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::De => "German",
            Language::Fr => "French",
            Language::Es => "Spanish",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Nl => "Dutch",
            Language::Pl => "Polish",
            Language::Ro => "Romanian",
            Language::Cs => "Czech",
        }
    }
}

/// What a batch of fragments is: affects prompt wording and cache identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    MealName,
    Ingredient,
    Instruction,
}

impl ContentKind {
    fn prompt_label(&self) -> &'static str {
        match self {
            ContentKind::MealName => "meal and recipe names",
            ContentKind::Ingredient => "ingredient names",
            ContentKind::Instruction => "cooking instructions",
        }
    }
}

/// Process-lifetime translation cache, keyed by content, kind and language.
///
/// Append-only: entries are only ever added, and a concurrent double-write
/// for the same key stores the same translation, so interleaving is
/// harmless. Injected into the resolver rather than living in a global.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: Mutex<HashMap<(String, ContentKind, Language), String>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, content: &str, kind: ContentKind, language: Language) -> Option<String> {
        self.entries
            .lock()
            .expect("translation cache poisoned")
            .get(&(content.to_string(), kind, language))
            .cloned()
    }

    pub fn insert(&self, content: String, kind: ContentKind, language: Language, value: String) {
        self.entries
            .lock()
            .expect("translation cache poisoned")
            .insert((content, kind, language), value);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("translation cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Test isolation only; production never invalidates.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("translation cache poisoned")
            .clear();
    }
}

/// Client for the external LLM translation endpoint.
///
/// Speaks the chat-completions shape: one user message in, one assistant
/// message out. Responses are parsed defensively: every field is optional
/// and anything unexpected becomes a fallback, never an error surfaced to
/// the user.
#[derive(Clone)]
pub struct TranslationClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

/// Default model requested from the endpoint.
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

impl TranslationClient {
    /// Create a client for the given endpoint.
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(base_url, None)
    }

    /// Send one prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let parsed = response.json::<ChatResponse>().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            anyhow::bail!("translation endpoint returned no content");
        }
        Ok(content)
    }
}

fn build_prompt(kind: ContentKind, fragments: &[&str], target: Language) -> String {
    let mut list = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        list.push_str(&format!("{}. {}\n", i + 1, fragment));
    }
    format!(
        "You are a professional translator. Translate the following {} from \
         English to {}.\n\nItems to translate:\n{}\nReturn your response as a \
         valid JSON object mapping each original text to its translation:\n\
         {{\n  \"original text\": \"translated text\"\n}}",
        kind.prompt_label(),
        target.english_name(),
        list
    )
}

/// Pull the first JSON object out of a completion, tolerating code fences
/// and surrounding prose.
fn extract_json_object(text: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(&text[start..=end]) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Resolve translations for one content kind.
///
/// Returns a mapping that covers **every** input fragment: translated where
/// possible, the original text otherwise. English targets and empty inputs
/// short-circuit without touching the collaborator. Fragments are
/// deduplicated, answered from the cache where possible, and the remainder
/// is requested in chunks of [`CHUNK_SIZE`].
pub async fn resolve_batch(
    client: Option<&TranslationClient>,
    cache: &TranslationCache,
    kind: ContentKind,
    fragments: &[String],
    target: Language,
) -> HashMap<String, String> {
    let mut resolved = HashMap::new();

    if target == Language::En || fragments.is_empty() {
        for fragment in fragments {
            resolved.insert(fragment.clone(), fragment.clone());
        }
        return resolved;
    }

    // Dedupe while keeping first-seen order for stable prompts.
    let mut seen = HashSet::new();
    let unique: Vec<&String> = fragments
        .iter()
        .filter(|f| seen.insert(f.as_str()))
        .collect();

    let mut pending: Vec<&str> = Vec::new();
    for fragment in &unique {
        match cache.get(fragment, kind, target) {
            Some(cached) => {
                resolved.insert((*fragment).clone(), cached);
            }
            None => pending.push(fragment.as_str()),
        }
    }

    let Some(client) = client else {
        // No collaborator configured: everything uncached stays English.
        for fragment in pending {
            resolved.insert(fragment.to_string(), fragment.to_string());
        }
        return resolved;
    };

    for chunk in pending.chunks(CHUNK_SIZE) {
        let prompt = build_prompt(kind, chunk, target);
        let translations = match client.complete(&prompt).await {
            Ok(text) => extract_json_object(&text),
            Err(e) => {
                warn!(kind = ?kind, error = %e, "translation request failed, falling back to originals");
                None
            }
        };

        for fragment in chunk {
            let translated = translations
                .as_ref()
                .and_then(|map| map.get(*fragment))
                .and_then(|value| value.as_str())
                .filter(|s| !s.is_empty());

            match translated {
                Some(text) => {
                    cache.insert(fragment.to_string(), kind, target, text.to_string());
                    resolved.insert(fragment.to_string(), text.to_string());
                }
                None => {
                    // Uncovered fragment: show it untranslated. Not cached,
                    // so a later request may still succeed.
                    resolved.insert(fragment.to_string(), fragment.to_string());
                }
            }
        }
    }

    debug!(
        kind = ?kind,
        total = unique.len(),
        "translation batch resolved"
    );
    resolved
}

/// Translate a plan's display text into the target language.
///
/// Returns a rewritten clone; identifiers, quantities and rollups are
/// untouched. The three content kinds are independent requests and run
/// concurrently.
pub async fn translate_meal_plan(
    client: Option<&TranslationClient>,
    cache: &TranslationCache,
    plan: &MealPlan,
    target: Language,
) -> MealPlan {
    if target == Language::En {
        return plan.clone();
    }

    let mut meal_names = Vec::new();
    let mut ingredients = Vec::new();
    let mut instructions = Vec::new();
    for day in &plan.days {
        for meal in &day.meals {
            meal_names.push(meal.recipe_name.clone());
            for ingredient in &meal.ingredients {
                ingredients.push(ingredient.name.clone());
            }
            instructions.extend(meal.cooking_instructions.iter().cloned());
        }
    }

    let (names_map, ingredients_map, instructions_map) = tokio::join!(
        resolve_batch(client, cache, ContentKind::MealName, &meal_names, target),
        resolve_batch(client, cache, ContentKind::Ingredient, &ingredients, target),
        resolve_batch(client, cache, ContentKind::Instruction, &instructions, target),
    );

    let mut translated = plan.clone();
    for day in &mut translated.days {
        for meal in &mut day.meals {
            if let Some(name) = names_map.get(&meal.recipe_name) {
                meal.recipe_name = name.clone();
            }
            for ingredient in &mut meal.ingredients {
                if let Some(name) = ingredients_map.get(&ingredient.name) {
                    ingredient.name = name.clone();
                }
            }
            for instruction in &mut meal.cooking_instructions {
                if let Some(text) = instructions_map.get(instruction) {
                    *instruction = text.clone();
                }
            }
        }
    }
    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Spin up a stub endpoint that counts requests and always replies with
    /// the given completion text.
    async fn spawn_stub(counter: Arc<AtomicUsize>, reply: String) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post({
                move |Json(_body): Json<serde_json::Value>| {
                    let counter = counter.clone();
                    let reply = reply.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(serde_json::json!({
                            "choices": [{ "message": { "content": reply } }]
                        }))
                    }
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn fragments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_english_target_never_calls_the_collaborator() {
        let counter = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(counter.clone(), "{}".to_string()).await;
        let client = TranslationClient::with_base_url(&base);
        let cache = TranslationCache::new();

        let input = fragments(&["Greek Yogurt", "Oats"]);
        let map = resolve_batch(
            Some(&client),
            &cache,
            ContentKind::Ingredient,
            &input,
            Language::En,
        )
        .await;

        assert_eq!(map.len(), 2);
        assert_eq!(map["Greek Yogurt"], "Greek Yogurt");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_successful_translation_populates_cache() {
        let counter = Arc::new(AtomicUsize::new(0));
        let reply = r#"{"Greek Yogurt": "Griechischer Joghurt", "Oats": "Haferflocken"}"#;
        let base = spawn_stub(counter.clone(), reply.to_string()).await;
        let client = TranslationClient::with_base_url(&base);
        let cache = TranslationCache::new();

        let input = fragments(&["Greek Yogurt", "Oats"]);
        let map = resolve_batch(
            Some(&client),
            &cache,
            ContentKind::Ingredient,
            &input,
            Language::De,
        )
        .await;

        assert_eq!(map["Greek Yogurt"], "Griechischer Joghurt");
        assert_eq!(map["Oats"], "Haferflocken");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_network() {
        let counter = Arc::new(AtomicUsize::new(0));
        let reply = r#"{"Oats": "Haferflocken"}"#;
        let base = spawn_stub(counter.clone(), reply.to_string()).await;
        let client = TranslationClient::with_base_url(&base);
        let cache = TranslationCache::new();

        let input = fragments(&["Oats"]);
        resolve_batch(Some(&client), &cache, ContentKind::Ingredient, &input, Language::De).await;
        let map =
            resolve_batch(Some(&client), &cache, ContentKind::Ingredient, &input, Language::De)
                .await;

        assert_eq!(map["Oats"], "Haferflocken");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_is_per_language_and_kind() {
        let cache = TranslationCache::new();
        cache.insert(
            "Oats".to_string(),
            ContentKind::Ingredient,
            Language::De,
            "Haferflocken".to_string(),
        );

        assert!(cache.get("Oats", ContentKind::Ingredient, Language::Fr).is_none());
        assert!(cache.get("Oats", ContentKind::MealName, Language::De).is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back_to_originals() {
        let counter = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(counter.clone(), "sorry, no can do".to_string()).await;
        let client = TranslationClient::with_base_url(&base);
        let cache = TranslationCache::new();

        let input = fragments(&["Oats"]);
        let map =
            resolve_batch(Some(&client), &cache, ContentKind::Ingredient, &input, Language::De)
                .await;

        assert_eq!(map["Oats"], "Oats");
        // Fallbacks are not cached, so a later call can retry.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_gracefully() {
        let client = TranslationClient::with_base_url("http://127.0.0.1:1");
        let cache = TranslationCache::new();

        let input = fragments(&["Oats", "Rice"]);
        let map =
            resolve_batch(Some(&client), &cache, ContentKind::Ingredient, &input, Language::De)
                .await;

        assert_eq!(map["Oats"], "Oats");
        assert_eq!(map["Rice"], "Rice");
    }

    #[tokio::test]
    async fn test_fragments_are_deduplicated_and_chunked() {
        let counter = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(counter.clone(), "{}".to_string()).await;
        let client = TranslationClient::with_base_url(&base);
        let cache = TranslationCache::new();

        // 61 unique fragments plus duplicates: 3 chunks of <= 30.
        let mut input: Vec<String> = (0..61).map(|i| format!("Ingredient {i}")).collect();
        input.extend(input.clone());

        let map =
            resolve_batch(Some(&client), &cache, ContentKind::Ingredient, &input, Language::De)
                .await;

        assert_eq!(map.len(), 61);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_extract_json_tolerates_code_fences() {
        let fenced = "```json\n{\"a\": \"b\"}\n```";
        let map = extract_json_object(fenced).unwrap();
        assert_eq!(map["a"], "b");

        assert!(extract_json_object("no object here").is_none());
        assert!(extract_json_object("}{").is_none());
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("de"), Some(Language::De));
        assert_eq!(Language::from_code("xx"), None);
        assert_eq!(Language::De.english_name(), "German");
    }
}
