use std::str::FromStr;

use codescope_store::DistanceMetric;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_provider();
        self.apply_env_overrides_index();
    }

    fn apply_env_overrides_provider(&mut self) {
        if let Ok(v) = std::env::var("CODESCOPE_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.provider = kind;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_MODEL") {
            self.model = Some(v);
        }
        if let Ok(v) = std::env::var("CODESCOPE_API_KEY") {
            self.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CODESCOPE_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("CODESCOPE_GOOGLE_PROJECT") {
            self.google_project = Some(v);
        }
        if let Ok(v) = std::env::var("CODESCOPE_GOOGLE_LOCATION") {
            self.google_location = v;
        }
        if let Ok(v) = std::env::var("CODESCOPE_MAX_RETRIES") {
            if let Ok(n) = v.parse::<u32>() {
                self.max_retries = n;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_MAX_RETRIES value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_EMBED_CONCURRENCY") {
            if let Ok(n) = v.parse::<usize>() {
                self.embed_concurrency = n;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_EMBED_CONCURRENCY value: {v}");
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn apply_env_overrides_index(&mut self) {
        if let Ok(v) = std::env::var("CODESCOPE_COLLECTION")
            && !v.trim().is_empty()
        {
            self.collection = v;
        }
        if let Ok(v) = std::env::var("CODESCOPE_DIMENSION") {
            if let Ok(n) = v.parse::<u64>() {
                self.dimension = Some(n);
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_DIMENSION value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_DISTANCE") {
            match DistanceMetric::from_str(&v) {
                Ok(distance) => self.distance = distance,
                Err(e) => tracing::warn!("ignoring invalid CODESCOPE_DISTANCE value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_EXCLUDE") {
            self.exclude = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("CODESCOPE_CHUNK_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                self.chunk_size = n;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_CHUNK_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_OVERLAP") {
            if let Ok(n) = v.parse::<usize>() {
                self.overlap = Some(n);
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_OVERLAP value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_WATCH")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.watch = enabled;
        }
        if let Ok(v) = std::env::var("CODESCOPE_QDRANT_URL") {
            self.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("CODESCOPE_QDRANT_API_KEY") {
            self.qdrant_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CODESCOPE_BATCH_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                self.batch_size = n;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_BATCH_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_SEARCH_LIMIT") {
            if let Ok(n) = v.parse::<usize>() {
                self.search_limit = n;
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_SEARCH_LIMIT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_MIN_SCORE") {
            if let Ok(score) = v.parse::<f32>() {
                self.min_score = Some(score);
            } else {
                tracing::warn!("ignoring invalid CODESCOPE_MIN_SCORE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESCOPE_RESPECT_GITIGNORE")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.respect_gitignore = enabled;
        }
        if let Ok(v) = std::env::var("CODESCOPE_REINDEX_FILES")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.reindex_files = enabled;
        }
    }
}
