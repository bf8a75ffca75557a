// SPDX-License-Identifier: GPL-3.0-or-later

//! Candidate matching against the remote catalog.
//!
//! A local track is resolved in up to three searches, each attempted only
//! when the previous one produced nothing acceptable:
//! 1. **Combined**: title and artist. An exact normalized match wins outright;
//!    otherwise the best weighted title/artist score above 0.5 is taken.
//! 2. **Title only**: best title score above 0.5.
//! 3. **Artist fallback**: every track by the artist, best title score above 0.45.
//!    The candidate's artist is not re-checked here.
//!
//! Ties go to the candidate the catalog ranked first.

use crate::catalog::CatalogSearch;
use crate::normalize::normalize;
use crate::similarity::similarity;
use local2stream_catalog::CatalogError;
use local2stream_domain::{
    CatalogCandidate, CatalogQuery, MatchKind, MatchOutcome, TrackQuery, MAX_SEARCH_LIMIT,
};
use tracing::{debug, warn};

pub const TITLE_WEIGHT: f64 = 0.7;
pub const ARTIST_WEIGHT: f64 = 0.3;
pub const FUZZY_THRESHOLD: f64 = 0.5;
pub const TITLE_ONLY_THRESHOLD: f64 = 0.5;
pub const ARTIST_FALLBACK_THRESHOLD: f64 = 0.45;

/// Result type for matching operations
pub type MatchingResult<T> = Result<T, CatalogError>;

/// Selects the single best catalog entry for a local track.
///
/// Stateless between calls; concurrent calls are fine as long as the
/// underlying [`CatalogSearch`] tolerates them.
#[derive(Debug, Clone)]
pub struct CandidateMatcher<C> {
    catalog: C,
    search_limit: u32,
}

impl<C: CatalogSearch> CandidateMatcher<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            search_limit: MAX_SEARCH_LIMIT,
        }
    }

    /// Results requested per search, clamped to `1..=50`.
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Find the best catalog entry for `query`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(outcome))` - A phase accepted a candidate
    /// * `Ok(None)` - Empty title, or no candidate cleared any threshold
    /// * `Err(CatalogError)` - A catalog search failed; later phases are not tried
    pub async fn find_match(&self, query: &TrackQuery) -> MatchingResult<Option<MatchOutcome>> {
        if !query.has_title() {
            debug!(target: "matching", "query has no title, skipping search");
            return Ok(None);
        }

        if let Some(outcome) = self.combined_phase(query).await? {
            return Ok(Some(outcome));
        }

        if let Some(outcome) = self.title_only_phase(query).await? {
            return Ok(Some(outcome));
        }

        if query.has_artist() {
            if let Some(outcome) = self.artist_fallback_phase(query).await? {
                return Ok(Some(outcome));
            }
        }

        debug!(target: "matching", title = %query.title, artist = %query.artist, "no acceptable candidate");
        Ok(None)
    }

    /// Like [`find_match`](Self::find_match), but a catalog failure is logged
    /// and reported as no match.
    pub async fn best_match(&self, query: &TrackQuery) -> Option<MatchOutcome> {
        match self.find_match(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    target: "matching",
                    title = %query.title,
                    artist = %query.artist,
                    error = %e,
                    "catalog search failed, treating as not found"
                );
                None
            }
        }
    }

    async fn combined_phase(&self, query: &TrackQuery) -> MatchingResult<Option<MatchOutcome>> {
        let candidates = self
            .search(CatalogQuery::track_and_artist(&query.title, &query.artist))
            .await?;

        let wanted_title = normalize(&query.title);
        let wanted_artist = normalize(&query.artist);

        if let Some(candidate) = candidates.iter().find(|candidate| {
            normalize(&candidate.name) == wanted_title
                && (wanted_artist.is_empty() || normalize(&candidate.artist_name) == wanted_artist)
        }) {
            debug!(target: "matching", candidate_id = %candidate.id, "exact match");
            return Ok(Some(MatchOutcome::exact(candidate)));
        }

        let has_artist = query.has_artist();
        let scored = candidates.iter().map(|candidate| {
            let title_score = similarity(&candidate.name, &query.title);
            let artist_score = if has_artist {
                similarity(&candidate.artist_name, &query.artist)
            } else {
                1.0
            };
            (candidate, TITLE_WEIGHT * title_score + ARTIST_WEIGHT * artist_score)
        });

        Ok(accept(scored, FUZZY_THRESHOLD, MatchKind::Fuzzy))
    }

    async fn title_only_phase(&self, query: &TrackQuery) -> MatchingResult<Option<MatchOutcome>> {
        let candidates = self.search(CatalogQuery::track(&query.title)).await?;
        let scored = candidates
            .iter()
            .map(|candidate| (candidate, similarity(&candidate.name, &query.title)));

        Ok(accept(scored, TITLE_ONLY_THRESHOLD, MatchKind::TitleOnly))
    }

    async fn artist_fallback_phase(
        &self,
        query: &TrackQuery,
    ) -> MatchingResult<Option<MatchOutcome>> {
        let candidates = self.search(CatalogQuery::artist(&query.artist)).await?;
        let scored = candidates
            .iter()
            .map(|candidate| (candidate, similarity(&candidate.name, &query.title)));

        Ok(accept(scored, ARTIST_FALLBACK_THRESHOLD, MatchKind::ArtistFallback))
    }

    async fn search(&self, query: CatalogQuery) -> MatchingResult<Vec<CatalogCandidate>> {
        let query = query.limit(self.search_limit);
        debug!(target: "matching", query = %query, "searching catalog");
        self.catalog.search(&query).await
    }
}

/// Highest-scoring candidate strictly above `threshold`; the first one wins ties.
pub fn select_best<'a, I>(scored: I, threshold: f64) -> Option<(&'a CatalogCandidate, f64)>
where
    I: IntoIterator<Item = (&'a CatalogCandidate, f64)>,
{
    let mut best: Option<(&CatalogCandidate, f64)> = None;
    for (candidate, score) in scored {
        if score > threshold && best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best
}

fn accept<'a, I>(scored: I, threshold: f64, kind: MatchKind) -> Option<MatchOutcome>
where
    I: IntoIterator<Item = (&'a CatalogCandidate, f64)>,
{
    select_best(scored, threshold).map(|(candidate, score)| {
        debug!(target: "matching", candidate_id = %candidate.id, score, kind = %kind, "candidate accepted");
        MatchOutcome::scored(candidate, kind, score)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Catalog fake answering by rendered query string and recording every search.
    #[derive(Default)]
    struct ScriptedCatalog {
        responses: HashMap<String, Vec<CatalogCandidate>>,
        failing: Option<String>,
        searches: Mutex<Vec<String>>,
    }

    impl ScriptedCatalog {
        fn respond(mut self, query: &str, candidates: Vec<CatalogCandidate>) -> Self {
            self.responses.insert(query.to_string(), candidates);
            self
        }

        fn fail_on(mut self, query: &str) -> Self {
            self.failing = Some(query.to_string());
            self
        }

        fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSearch for ScriptedCatalog {
        async fn search(
            &self,
            query: &CatalogQuery,
        ) -> Result<Vec<CatalogCandidate>, CatalogError> {
            let rendered = query.to_query_string();
            self.searches.lock().unwrap().push(rendered.clone());
            if self.failing.as_deref() == Some(rendered.as_str()) {
                return Err(CatalogError::ApiError {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self.responses.get(&rendered).cloned().unwrap_or_default())
        }
    }

    fn candidate(id: &str, name: &str, artist: &str) -> CatalogCandidate {
        CatalogCandidate::new(id, name, artist)
    }

    const BEATLES_COMBINED: &str = r#"track:"Yesterday" artist:"The Beatles""#;

    #[tokio::test]
    async fn exact_match_takes_first_in_result_order() {
        let catalog = ScriptedCatalog::default().respond(
            BEATLES_COMBINED,
            vec![
                candidate("yesterday-1965", "Yesterday", "The Beatles"),
                candidate("yesterday-2009", "Yesterday - Remastered 2009", "The Beatles"),
                candidate("yesterday-dup", "Yesterday", "The Beatles"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("Yesterday", "The Beatles"))
            .await
            .unwrap()
            .expect("exact match");

        assert_eq!(outcome.kind, MatchKind::Exact);
        assert_eq!(outcome.confidence, 1.0);
        assert_eq!(outcome.candidate_id, "yesterday-1965");
        assert_eq!(matcher.catalog().searches(), vec![BEATLES_COMBINED]);
    }

    #[tokio::test]
    async fn exact_match_ignores_annotations_and_case() {
        let catalog = ScriptedCatalog::default().respond(
            r#"track:"yesterday (remastered 2009)" artist:"the beatles""#,
            vec![
                candidate("other", "Yesterday Once More", "Carpenters"),
                candidate("hit", "YESTERDAY", "The Beatles"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("yesterday (remastered 2009)", "the beatles"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::Exact);
        assert_eq!(outcome.candidate_id, "hit");
    }

    #[tokio::test]
    async fn exact_match_without_artist_accepts_any_artist() {
        let catalog = ScriptedCatalog::default().respond(
            r#"track:"Yesterday""#,
            vec![candidate("cover", "Yesterday", "Some Cover Band")],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::title_only("Yesterday"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::Exact);
        assert_eq!(outcome.candidate_id, "cover");
    }

    #[tokio::test]
    async fn wrong_artist_falls_through_to_fuzzy() {
        let catalog = ScriptedCatalog::default().respond(
            BEATLES_COMBINED,
            vec![
                candidate("cover", "Yesterday", "Beatles Tribute"),
                candidate("remaster", "Yesterday - Remastered 2009", "The Beatles"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("Yesterday", "The Beatles"))
            .await
            .unwrap()
            .unwrap();

        // remaster: title 0.85 (containment), artist 1.0 => 0.895
        // cover: title 1.0, artist < 0.65
        assert_eq!(outcome.kind, MatchKind::Fuzzy);
        assert_eq!(outcome.candidate_id, "remaster");
        assert!(outcome.confidence > FUZZY_THRESHOLD && outcome.confidence < 1.0);
        assert_eq!(matcher.catalog().searches().len(), 1);
    }

    #[tokio::test]
    async fn fuzzy_ties_keep_first_candidate() {
        let catalog = ScriptedCatalog::default().respond(
            BEATLES_COMBINED,
            vec![
                candidate("first", "Yesterday Live", "The Beatles"),
                candidate("second", "Yesterday Live", "The Beatles"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("Yesterday", "The Beatles"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::Fuzzy);
        assert_eq!(outcome.candidate_id, "first");
    }

    #[tokio::test]
    async fn fuzzy_confidence_below_one_even_for_perfect_scores() {
        // Equal after stripping spaces but not after normalization.
        let catalog = ScriptedCatalog::default().respond(
            r#"track:"HeyJude" artist:"The Beatles""#,
            vec![candidate("jude", "Hey Jude", "The Beatles")],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("HeyJude", "The Beatles"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::Fuzzy);
        assert!(outcome.confidence < 1.0);
    }

    #[tokio::test]
    async fn annotation_only_title_matches_fuzzily() {
        let catalog = ScriptedCatalog::default().respond(
            r#"track:"(Intro)" artist:"Daft Punk""#,
            vec![candidate("da-funk", "Da Funk", "Daft Punk")],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("(Intro)", "Daft Punk"))
            .await
            .unwrap()
            .expect("fuzzy match");

        // title 0.85 via containment of the empty normalized title, artist 1.0
        assert_eq!(outcome.kind, MatchKind::Fuzzy);
        assert_eq!(outcome.candidate_id, "da-funk");
        assert!((outcome.confidence - 0.895).abs() < 1e-9);
    }

    #[tokio::test]
    async fn title_only_phase_runs_after_empty_combined_search() {
        let catalog = ScriptedCatalog::default().respond(
            r#"track:"Around the World""#,
            vec![
                candidate("unrelated", "Zzz", "Nobody"),
                candidate("atw", "Around the World - Radio Edit", "Daft Punk"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("Around the World", "Daft Pnuk"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::TitleOnly);
        assert_eq!(outcome.candidate_id, "atw");
        assert_eq!(
            matcher.catalog().searches(),
            vec![
                r#"track:"Around the World" artist:"Daft Pnuk""#,
                r#"track:"Around the World""#,
            ]
        );
    }

    #[tokio::test]
    async fn title_only_rejects_score_of_exactly_half() {
        // "ab" vs "ac" scores exactly 0.5
        let catalog = ScriptedCatalog::default()
            .respond(r#"track:"ac""#, vec![candidate("ab", "ab", "Someone")]);
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("ac", "Artist"))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(matcher.catalog().searches().len(), 3);
    }

    #[tokio::test]
    async fn artist_fallback_accepts_wrong_title_spelling() {
        let catalog = ScriptedCatalog::default().respond(
            r#"artist:"Daft Punk""#,
            vec![
                candidate("da-funk", "Da Funk", "Daft Punk"),
                candidate("omt", "One More Time", "Daft Punk"),
            ],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("One Mor Tme", "Daft Punk"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::ArtistFallback);
        assert_eq!(outcome.candidate_id, "omt");
        assert!(outcome.confidence > ARTIST_FALLBACK_THRESHOLD);
        assert_eq!(matcher.catalog().searches().len(), 3);
    }

    #[tokio::test]
    async fn artist_fallback_does_not_check_candidate_artist() {
        let catalog = ScriptedCatalog::default().respond(
            r#"artist:"Daft Punk""#,
            vec![candidate("impostor", "One More Time", "Not Daft Punk At All")],
        );
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .find_match(&TrackQuery::new("One More Time", "Daft Punk"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kind, MatchKind::ArtistFallback);
        assert_eq!(outcome.candidate_artist, "Not Daft Punk At All");
    }

    #[tokio::test]
    async fn artist_fallback_skipped_without_artist() {
        let matcher = CandidateMatcher::new(ScriptedCatalog::default());

        let outcome = matcher
            .find_match(&TrackQuery::title_only("Nothing Matches"))
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert_eq!(
            matcher.catalog().searches(),
            vec![r#"track:"Nothing Matches""#, r#"track:"Nothing Matches""#]
        );
    }

    #[tokio::test]
    async fn empty_title_issues_no_search() {
        let matcher = CandidateMatcher::new(ScriptedCatalog::default());

        for query in [TrackQuery::new("", "Daft Punk"), TrackQuery::new("   ", "")] {
            assert!(matcher.find_match(&query).await.unwrap().is_none());
        }
        assert!(matcher.catalog().searches().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_is_an_error_for_find_match() {
        let catalog = ScriptedCatalog::default().fail_on(r#"track:"Yesterday""#);
        let matcher = CandidateMatcher::new(catalog);
        let query = TrackQuery::new("Yesterday", "The Beatles");

        let result = matcher.find_match(&query).await;
        assert!(matches!(result, Err(CatalogError::ApiError { status: 503, .. })));
        // Phase 3 never ran.
        assert_eq!(matcher.catalog().searches().len(), 2);
    }

    #[tokio::test]
    async fn catalog_failure_is_absent_for_best_match() {
        let catalog = ScriptedCatalog::default().fail_on(BEATLES_COMBINED);
        let matcher = CandidateMatcher::new(catalog);

        let outcome = matcher
            .best_match(&TrackQuery::new("Yesterday", "The Beatles"))
            .await;

        assert!(outcome.is_none());
        assert_eq!(matcher.catalog().searches().len(), 1);
    }

    #[test]
    fn select_best_threshold_is_strict() {
        let a = candidate("a", "A", "");
        let b = candidate("b", "B", "");

        assert!(select_best([(&a, 0.5)], FUZZY_THRESHOLD).is_none());
        assert_eq!(
            select_best([(&a, 0.50001)], FUZZY_THRESHOLD).map(|(c, _)| c.id.as_str()),
            Some("a")
        );
        assert!(select_best([(&a, 0.45)], ARTIST_FALLBACK_THRESHOLD).is_none());
        assert_eq!(
            select_best([(&b, 0.4501)], ARTIST_FALLBACK_THRESHOLD).map(|(c, _)| c.id.as_str()),
            Some("b")
        );
    }

    #[test]
    fn select_best_prefers_first_on_equal_scores() {
        let a = candidate("a", "A", "");
        let b = candidate("b", "B", "");
        let c = candidate("c", "C", "");

        let best = select_best([(&a, 0.6), (&b, 0.8), (&c, 0.8)], 0.5).unwrap();
        assert_eq!(best.0.id, "b");
        assert_eq!(best.1, 0.8);
    }

    #[test]
    fn select_best_of_nothing() {
        assert!(select_best(std::iter::empty(), 0.0).is_none());
    }

    #[tokio::test]
    async fn search_limit_is_passed_to_catalog() {
        #[derive(Default)]
        struct LimitRecorder(Mutex<Vec<u32>>);

        #[async_trait]
        impl CatalogSearch for LimitRecorder {
            async fn search(
                &self,
                query: &CatalogQuery,
            ) -> Result<Vec<CatalogCandidate>, CatalogError> {
                self.0.lock().unwrap().push(query.limit);
                Ok(Vec::new())
            }
        }

        let matcher = CandidateMatcher::new(LimitRecorder::default()).with_search_limit(20);
        matcher
            .find_match(&TrackQuery::new("Song", "Artist"))
            .await
            .unwrap();

        assert_eq!(*matcher.catalog().0.lock().unwrap(), vec![20, 20, 20]);
    }
}
