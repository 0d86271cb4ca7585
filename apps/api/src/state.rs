use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::classifier::RelevanceClassifier;
use crate::config::Config;
use crate::llm_client::AnswerGenerator;
use crate::rate_limit::IpRateLimiter;
use crate::resume_store::ResumeStore;
use crate::roles::RoleRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every component is built once in `main` and shared read-only; the rate
/// limiter and cache synchronize internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub classifier: Arc<RelevanceClassifier>,
    pub rate_limiter: Arc<IpRateLimiter>,
    pub cache: Arc<ResponseCache>,
    pub roles: Arc<RoleRegistry>,
    pub resume: Arc<ResumeStore>,
    /// Pluggable answer generator. Gemini in production, a stub in tests.
    pub llm: Arc<dyn AnswerGenerator>,
    /// Base system instruction, before role modifiers are appended.
    pub system_instruction: Arc<str>,
}

#[cfg(test)]
pub mod test_support {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::MemoryStore;
    use crate::clock::{Clock, ManualClock};
    use crate::llm_client::LlmError;
    use crate::rate_limit::RateLimits;

    /// Answers every prompt with a fixed reply, or fails when `reply` is `None`.
    pub struct StubGenerator {
        reply: Option<String>,
        calls: AtomicUsize,
        last_system: Mutex<String>,
    }

    impl StubGenerator {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_system: Mutex::new(String::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                last_system: Mutex::new(String::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_system(&self) -> String {
            self.last_system
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl AnswerGenerator for StubGenerator {
        async fn generate(&self, system: &str, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_system.lock().unwrap_or_else(PoisonError::into_inner) = system.to_string();
            self.reply.clone().ok_or(LlmError::EmptyContent)
        }
    }

    /// Writes two roles and three résumé sections under `dir`.
    pub fn write_fixture_data(dir: &Path) {
        let roles = dir.join("roles");
        std::fs::create_dir_all(&roles).unwrap();

        let role = |id: &str, name: &str, focus: &[&str], example: &str| {
            json!({
                "id": id,
                "name": name,
                "description": format!("Visão de {name}"),
                "icon": "👤",
                "color": "#336699",
                "focus_areas": focus,
                "prompt_modifiers": {
                    "prefix": format!("Você conversa com um {name}."),
                    "emphasis": ["Resultados concretos"],
                    "avoid": ["Jargão excessivo"]
                },
                "example_questions": [example]
            })
        };
        let files = [
            (
                "recruiter.json",
                role(
                    "recruiter",
                    "Recrutador",
                    &["professional_experience", "skills", "academic_background"],
                    "Qual a experiência profissional?",
                ),
            ),
            (
                "developer.json",
                role("developer", "Desenvolvedor", &["skills", "projects"], "Quais tecnologias?"),
            ),
        ];
        for (name, body) in files {
            std::fs::write(roles.join(name), body.to_string()).unwrap();
        }

        let sections = [
            (
                "academic_background.json",
                json!({"academic_background": [
                    {"degree": "Engenharia de Software", "school": "UFSC", "year": 2022}
                ]}),
            ),
            ("skills.json", json!({"skills": ["Rust", "Python", "React"]})),
            (
                "projects.json",
                json!({"projects": [{"name": "Chatbot", "description": "Currículo interativo"}]}),
            ),
        ];
        for (name, body) in sections {
            std::fs::write(dir.join(name), body.to_string()).unwrap();
        }
    }

    /// State over fixture data in `dir` with an in-memory cache and the given
    /// generator. Returns the clock so tests can age cache and windows.
    pub fn test_state(dir: &Path, llm: Arc<dyn AnswerGenerator>) -> (AppState, Arc<ManualClock>) {
        test_state_with_limits(dir, llm, RateLimits::default())
    }

    pub fn test_state_with_limits(
        dir: &Path,
        llm: Arc<dyn AnswerGenerator>,
        limits: RateLimits,
    ) -> (AppState, Arc<ManualClock>) {
        write_fixture_data(dir);
        let clock = Arc::new(ManualClock::new());
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let config = Config::for_tests(dir);
        let roles = RoleRegistry::load(&config.roles_dir());
        let classifier = RelevanceClassifier::new(roles.priorities()).unwrap();
        let cache = ResponseCache::new(
            Box::new(MemoryStore::new()),
            Duration::from_secs(3600),
            shared_clock.clone(),
        );

        let state = AppState {
            resume: Arc::new(ResumeStore::new(&config.data_dir)),
            config,
            classifier: Arc::new(classifier),
            rate_limiter: Arc::new(IpRateLimiter::new(limits, shared_clock)),
            cache: Arc::new(cache),
            roles: Arc::new(roles),
            llm,
            system_instruction: Arc::from("Instrução base."),
        };
        (state, clock)
    }
}
