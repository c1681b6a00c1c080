//! Marker layer: one policy, its resolver, and its store
//!
//! This is the engine as the page uses it. Loading decodes every stored
//! anchor and renders it in store order; creating encodes a selection into a
//! draft and renders it once the persistence layer has assigned an id;
//! deleting unwraps every fragment and drops the record.
//!
//! Markers that cannot be placed (container not mounted, text diverged) are
//! reported and skipped, never raised.

use serde::Serialize;
use thiserror::Error;

use crate::anchor::{self, Anchor, AnchorError, SelectionIssue, SelectionRange};
use crate::dom::walk::closest_within;
use crate::dom::{DomError, TextTree};
use crate::markers::{
    ContainerKey, MarkerDraft, MarkerId, MarkerKind, MarkerPolicy, MarkerRecord, MarkerStore, COMMENTARY_TAG,
};
use crate::render::{is_rendered, owned_ranges, unwrap, wrap};
use crate::resolver::ContainerResolver;
use crate::text::flat_text;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("unknown marker {0}")]
    UnknownMarker(MarkerId),

    #[error("{0:?} markers carry no note")]
    NoNotes(MarkerKind),
}

/// Result of applying one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Rendered { fragments: usize },
    /// The container already holds wrappers for this id
    AlreadyRendered,
    /// The container's text no longer holds the anchored occurrence
    NotFound,
    /// Container not mounted (or the record has no usable key)
    ContainerMissing,
}

impl ApplyOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ApplyOutcome::NotFound | ApplyOutcome::ContainerMissing)
    }
}

/// Summary of applying many records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub rendered: usize,
    pub already_rendered: usize,
    /// Records left unrendered, with the reason
    pub skipped: Vec<(Option<MarkerId>, ApplyOutcome)>,
}

impl ApplyReport {
    fn record(&mut self, id: Option<MarkerId>, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Rendered { .. } => self.rendered += 1,
            ApplyOutcome::AlreadyRendered => self.already_rendered += 1,
            skipped => self.skipped.push((id, skipped)),
        }
    }
}

pub struct MarkerLayer<R> {
    policy: MarkerPolicy,
    resolver: R,
    store: MarkerStore,
    /// Owner of non-commentary containers on this page
    question_id: Option<u64>,
}

impl<R> MarkerLayer<R> {
    pub fn new(policy: MarkerPolicy, resolver: R, question_id: Option<u64>) -> Self {
        Self {
            policy,
            resolver,
            store: MarkerStore::new(),
            question_id,
        }
    }

    pub fn policy(&self) -> &MarkerPolicy {
        &self.policy
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn find(&self, id: &MarkerId) -> Option<&MarkerRecord> {
        self.store.find(id)
    }

    /// Replace the store with a server list and render it in list order
    pub fn load<T>(&mut self, tree: &mut T, scopes: &[T::Node], records: Vec<MarkerRecord>) -> Result<ApplyReport, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        self.store = MarkerStore::from_records(records);
        self.apply_all(tree, scopes)
    }

    /// Add a later list (e.g. for a lazily mounted pane) to the store
    ///
    /// Records whose id is already stored are ignored; the rest are appended
    /// in list order and only they are rendered.
    pub fn merge<T>(&mut self, tree: &mut T, scopes: &[T::Node], records: Vec<MarkerRecord>) -> Result<ApplyReport, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let mut report = ApplyReport::default();
        let mut duplicates = 0;
        for record in records {
            if record.id.as_ref().is_some_and(|id| self.store.find(id).is_some()) {
                duplicates += 1;
                continue;
            }
            let outcome = self.apply(tree, scopes, &record)?;
            report.record(record.id.clone(), outcome);
            self.store.add(record);
        }
        log::info!(
            "merged {:?} markers: {} rendered, {} skipped, {} already stored",
            self.policy.kind,
            report.rendered,
            report.skipped.len(),
            duplicates
        );
        Ok(report)
    }

    /// Render every stored record, in store order
    pub fn apply_all<T>(&self, tree: &mut T, scopes: &[T::Node]) -> Result<ApplyReport, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let mut report = ApplyReport::default();
        for record in self.store.all() {
            let outcome = self.apply(tree, scopes, record)?;
            report.record(record.id.clone(), outcome);
        }
        log::info!(
            "applied {:?} markers: {} rendered, {} already present, {} skipped",
            self.policy.kind,
            report.rendered,
            report.already_rendered,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Render one record, resolving its container across `scopes`
    pub fn apply<T>(&self, tree: &mut T, scopes: &[T::Node], record: &MarkerRecord) -> Result<ApplyOutcome, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let key = match self.policy.key_for(record, self.question_id) {
            Some(key) => key,
            None => {
                log::warn!("marker {:?} has no usable container key", record.id);
                return Ok(ApplyOutcome::ContainerMissing);
            }
        };
        match self.resolver.resolve_any(&*tree, scopes, &key) {
            Some(container) => self.apply_in(tree, &container, record),
            None => {
                log::debug!("container {} not rendered, skipping marker {:?}", key, record.id);
                Ok(ApplyOutcome::ContainerMissing)
            }
        }
    }

    /// Render stored records whose containers live in a newly mounted pane
    ///
    /// Records for containers elsewhere are ignored; records already drawn
    /// in the pane are left as they are.
    pub fn apply_to_pane<T>(&self, tree: &mut T, pane: &T::Node) -> Result<ApplyReport, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let mut report = ApplyReport::default();
        for record in self.store.all() {
            let Some(key) = self.policy.key_for(record, self.question_id) else {
                continue;
            };
            let Some(container) = self.resolver.resolve(&*tree, pane, &key) else {
                continue;
            };
            let outcome = self.apply_in(tree, &container, record)?;
            report.record(record.id.clone(), outcome);
        }
        Ok(report)
    }

    fn apply_in<T: TextTree>(&self, tree: &mut T, container: &T::Node, record: &MarkerRecord) -> Result<ApplyOutcome, DomError> {
        let Some(id) = record.id.as_ref() else {
            log::warn!("refusing to render unsaved marker {:?}", record.selected_text);
            return Ok(ApplyOutcome::NotFound);
        };
        if is_rendered(&*tree, container, id, &self.policy) {
            return Ok(ApplyOutcome::AlreadyRendered);
        }

        let flat = flat_text(&*tree, container);
        let Some(range) = record.anchor().locate(&flat) else {
            log::debug!(
                "occurrence {} of {:?} not found for marker {}",
                record.occurrence_index,
                record.selected_text,
                id
            );
            return Ok(ApplyOutcome::NotFound);
        };

        let fragments = wrap(tree, container, range, id, &self.policy)?.len();
        Ok(ApplyOutcome::Rendered { fragments })
    }

    /// Turn a live selection into a create payload
    ///
    /// Both ends must sit in the same container. With an exclusive policy a
    /// selection touching text already claimed by a marker is rejected.
    pub fn encode_selection<T>(&self, tree: &T, selection: &SelectionRange<T::Node>) -> Result<MarkerDraft, AnchorError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let start = self
            .resolver
            .container_of(tree, &selection.start.node)
            .ok_or(SelectionIssue::OutsideContainer)?;
        let end = self
            .resolver
            .container_of(tree, &selection.end.node)
            .ok_or(SelectionIssue::OutsideContainer)?;
        if start != end {
            return Err(SelectionIssue::CrossesContainers.into());
        }
        let key = self.resolver.key_of(tree, &start).ok_or(SelectionIssue::OutsideContainer)?;

        let encoded = anchor::encode_selection(tree, &start, selection)?;
        if self.policy.exclusive
            && owned_ranges(tree, &start, &self.policy)
                .iter()
                .any(|owned| owned.intersects(&encoded.range))
        {
            return Err(SelectionIssue::OverlapsMarker.into());
        }

        Ok(self.draft_for(key, encoded.anchor))
    }

    fn draft_for(&self, key: ContainerKey, anchor: Anchor) -> MarkerDraft {
        let (content_type_tag, question_id, commentary_id) = match (self.policy.kind, key) {
            (MarkerKind::Highlight, ContainerKey::Commentary { commentary_id }) => (None, None, Some(commentary_id)),
            (MarkerKind::Highlight, ContainerKey::Content { question_id, .. }) => (None, Some(question_id), None),
            (MarkerKind::Annotation, ContainerKey::Commentary { commentary_id }) => {
                (Some(COMMENTARY_TAG.to_string()), self.question_id, Some(commentary_id))
            }
            (
                MarkerKind::Annotation,
                ContainerKey::Content {
                    content_type,
                    question_id,
                },
            ) => (Some(content_type), Some(question_id), None),
        };
        MarkerDraft {
            question_id,
            content_type_tag,
            commentary_id,
            selected_text: anchor.selected_text,
            occurrence_index: anchor.occurrence_index,
            comment_text: None,
        }
    }

    /// Store and render a marker the persistence layer has just created
    pub fn commit_created<T>(
        &mut self,
        tree: &mut T,
        scopes: &[T::Node],
        draft: MarkerDraft,
        id: MarkerId,
    ) -> Result<ApplyOutcome, DomError>
    where
        T: TextTree,
        R: ContainerResolver<T>,
    {
        let record = MarkerRecord::from_draft(draft, id);
        let outcome = self.apply(tree, scopes, &record)?;
        self.store.add(record);
        Ok(outcome)
    }

    /// Record an edited note (anchor and id are immutable)
    pub fn update_note(&mut self, id: &MarkerId, note: &str) -> Result<(), LayerError> {
        if !self.policy.has_notes() {
            return Err(LayerError::NoNotes(self.policy.kind));
        }
        if self.store.update_note(id, note) {
            Ok(())
        } else {
            Err(LayerError::UnknownMarker(id.clone()))
        }
    }

    /// Unrender a deleted marker and drop it from the store
    pub fn remove<T>(&mut self, tree: &mut T, scopes: &[T::Node], id: &MarkerId) -> Result<Option<MarkerRecord>, DomError>
    where
        T: TextTree,
    {
        let mut removed = 0;
        for scope in scopes {
            removed += unwrap(tree, scope, id, &self.policy)?;
        }
        log::debug!("removed marker {} ({} fragment(s))", id, removed);
        Ok(self.store.remove(id))
    }

    /// Marker whose wrapper encloses `node` (innermost first)
    pub fn marker_at<T: TextTree>(&self, tree: &T, node: &T::Node) -> Option<MarkerId> {
        let wrapper = closest_within(tree, node, None, |n| self.policy.is_wrapper(tree, n))?;
        tree.attribute(&wrapper, &self.policy.id_attribute)
            .map(|value| MarkerId::parse(&value))
    }
}
