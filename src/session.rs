// Decides what submitting a draft term pair should do.
use crate::cache::{CacheKey, ComparisonCache, FetchMode};
use crate::model::CompareError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// One of the drafts is empty after trimming.
    InvalidInput,
    /// Same pair as the one already shown.
    NoChanges,
    /// Data is shown and the drafts differ from it.
    TryAgain,
    Compare,
}

impl SubmitState {
    pub fn label(&self) -> &'static str {
        match self {
            SubmitState::NoChanges => "No changes to search",
            SubmitState::TryAgain => "Try again",
            SubmitState::InvalidInput | SubmitState::Compare => "Compare",
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, SubmitState::Compare | SubmitState::TryAgain)
    }
}

/// Remembers the last confirmed pair.
#[derive(Debug, Default)]
pub struct ComparisonSession {
    confirmed: Option<CacheKey>,
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed(&self) -> Option<&CacheKey> {
        self.confirmed.as_ref()
    }

    pub fn has_changed(&self, draft1: &str, draft2: &str) -> bool {
        match &self.confirmed {
            None => true,
            Some(key) => draft1.trim() != key.term1() || draft2.trim() != key.term2(),
        }
    }

    pub fn submit_state(&self, draft1: &str, draft2: &str, has_data: bool) -> SubmitState {
        if draft1.trim().is_empty() || draft2.trim().is_empty() {
            return SubmitState::InvalidInput;
        }
        match (self.has_changed(draft1, draft2), has_data) {
            (false, true) => SubmitState::NoChanges,
            (true, true) => SubmitState::TryAgain,
            (_, false) => SubmitState::Compare,
        }
    }

    /// Records the trimmed pair. Returns the key to request, or `None`
    /// when it matches the pair already confirmed.
    pub fn confirm(&mut self, draft1: &str, draft2: &str) -> Result<Option<CacheKey>, CompareError> {
        let key = CacheKey::new(draft1, draft2)?;
        if self.confirmed.as_ref() == Some(&key) {
            return Ok(None);
        }
        self.confirmed = Some(key.clone());
        Ok(Some(key))
    }
}

/// Turns a draft pair into the cache request it calls for, if any.
///
/// An unchanged pair that already has data is refreshed with
/// `FetchMode::Force`; a new or edited pair is confirmed and requested
/// normally.
pub async fn plan_request(
    session: &mut ComparisonSession,
    cache: &ComparisonCache,
    draft1: &str,
    draft2: &str,
) -> Option<(CacheKey, FetchMode)> {
    let has_data = match session.confirmed() {
        Some(key) => cache.snapshot(key).await.data.is_some(),
        None => false,
    };

    let state = session.submit_state(draft1, draft2, has_data);
    debug!("'{}' vs '{}': {}", draft1, draft2, state.label());
    match state {
        SubmitState::InvalidInput => {
            warn!("Skipping comparison '{}' vs '{}': empty term", draft1, draft2);
            None
        }
        SubmitState::NoChanges => session.confirmed().cloned().map(|key| (key, FetchMode::Force)),
        SubmitState::Compare | SubmitState::TryAgain => match session.confirm(draft1, draft2) {
            Ok(Some(key)) => Some((key, FetchMode::IfChanged)),
            Ok(None) => session.confirmed().cloned().map(|key| (key, FetchMode::IfChanged)),
            Err(e) => {
                warn!("Skipping comparison '{}' vs '{}': {}", draft1, draft2, e);
                None
            }
        },
    }
}
