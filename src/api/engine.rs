//! Page-wide marker engine exposed to JavaScript
//!
//! One engine per page holds both marker layers and their controllers. DOM
//! handles are never stored: every call takes the live document from the
//! window, so state survives navigation inside the page and lazily mounted
//! panes are seen as soon as they exist.

use std::sync::Mutex;

use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Node};

use super::helpers::{deserialize, engine_error, parse_kind, serialize};
use crate::config::EngineConfig;
use crate::controller::{ControllerError, SelectionController, UiState};
use crate::dom::browser::BrowserDom;
use crate::layer::{ApplyOutcome, ApplyReport, MarkerLayer};
use crate::markers::{MarkerDraft, MarkerId, MarkerKind, MarkerPolicy};
use crate::persist::{CreateResponse, DeleteResponse, ListResponse, UpdatePayload, UpdateResponse};
use crate::resolver::selector::SelectorResolver;
use crate::{wasm_info, wasm_log, wasm_warn};

/// One marker kind: its layer plus its popover state
struct Channel {
    layer: MarkerLayer<SelectorResolver>,
    ui: SelectionController,
}

impl Channel {
    fn new(policy: MarkerPolicy, question_id: Option<u64>) -> Self {
        let kind = policy.kind;
        Self {
            layer: MarkerLayer::new(policy.clone(), SelectorResolver::new(policy), question_id),
            ui: SelectionController::new(kind),
        }
    }
}

struct Engine {
    config: EngineConfig,
    annotations: Channel,
    highlights: Channel,
}

impl Engine {
    fn new(config: EngineConfig) -> Self {
        let question_id = config.question_id;
        Self {
            annotations: Channel::new(config.annotations.clone(), question_id),
            highlights: Channel::new(config.highlights.clone(), question_id),
            config,
        }
    }

    fn channel(&mut self, kind: MarkerKind) -> &mut Channel {
        match kind {
            MarkerKind::Annotation => &mut self.annotations,
            MarkerKind::Highlight => &mut self.highlights,
        }
    }

    /// Opening one kind's affordance closes the other's
    fn close_others(&mut self, kind: MarkerKind) {
        let other = match kind {
            MarkerKind::Annotation => &mut self.highlights,
            MarkerKind::Highlight => &mut self.annotations,
        };
        other.ui.close();
    }
}

// WASM-owned engine state
lazy_static! {
    static ref ENGINE: Mutex<Option<Engine>> = Mutex::new(None);
}

fn with_engine<R>(f: impl FnOnce(&mut Engine) -> Result<R, JsValue>) -> Result<R, JsValue> {
    let mut guard = ENGINE
        .lock()
        .map_err(|_| engine_error("Engine lock", "poisoned"))?;
    let engine = guard
        .as_mut()
        .ok_or_else(|| engine_error("Engine", "not initialized; call initMarkers first"))?;
    f(engine)
}

fn page() -> Result<(BrowserDom, Vec<Node>), JsValue> {
    let dom = BrowserDom::from_window().map_err(|e| engine_error("DOM", e))?;
    let body = dom.body().ok_or_else(|| engine_error("DOM", "document has no body"))?;
    Ok((dom, vec![body]))
}

/// Parse a server JSON body
///
/// Goes through `JSON.stringify` so numeric ids keep their integer form.
fn from_json<T: DeserializeOwned>(value: &JsValue, error_context: &str) -> Result<T, JsValue> {
    let text = js_sys::JSON::stringify(value)
        .map(String::from)
        .map_err(|e| engine_error(error_context, format!("{:?}", e)))?;
    serde_json::from_str(&text).map_err(|e| engine_error(error_context, e))
}

fn draft_or_null(state: &UiState) -> Result<JsValue, JsValue> {
    match state {
        UiState::Selecting { draft } | UiState::Composing { draft } => serialize(draft, "Draft serialization error"),
        _ => Ok(JsValue::NULL),
    }
}

fn controller_error(err: ControllerError) -> JsValue {
    engine_error("Marker UI", err)
}

/// A request the host should send
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingRequest<B: Serialize> {
    id: MarkerId,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<B>,
}

#[derive(Serialize)]
struct PaneReport {
    annotations: ApplyReport,
    highlights: ApplyReport,
}

/// Initialize (or reinitialize) the engine from a configuration object
///
/// `undefined` or `null` selects the default policies with empty endpoints.
#[wasm_bindgen(js_name = initMarkers)]
pub fn init_markers(config_js: JsValue) -> Result<(), JsValue> {
    let config: EngineConfig = if config_js.is_undefined() || config_js.is_null() {
        EngineConfig::default()
    } else {
        deserialize(config_js, "Config deserialization error")?
    };
    config.validate().map_err(|e| engine_error("Invalid config", e))?;

    wasm_info!("initMarkers: question_id={:?}", config.question_id);
    let mut guard = ENGINE
        .lock()
        .map_err(|_| engine_error("Engine lock", "poisoned"))?;
    *guard = Some(Engine::new(config));
    Ok(())
}

/// List URL for `kind`; highlight lists take the mounted commentary ids
#[wasm_bindgen(js_name = listUrl)]
pub fn list_url(kind: &str, commentary_ids_js: JsValue) -> Result<String, JsValue> {
    let kind = parse_kind(kind)?;
    let ids: Vec<u64> = match kind {
        MarkerKind::Annotation => Vec::new(),
        MarkerKind::Highlight => deserialize(commentary_ids_js, "Commentary id deserialization error")?,
    };
    with_engine(|engine| Ok(engine.config.list_url(kind, &ids)))
}

/// Replace the store with a list response and render it
#[wasm_bindgen(js_name = loadMarkers)]
pub fn load_markers(kind: &str, response_js: JsValue) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    let response: ListResponse = from_json(&response_js, "List response error")?;
    let records = response.into_records();
    wasm_log!("loadMarkers: {:?}, {} record(s)", kind, records.len());

    let (mut dom, scopes) = page()?;
    let report = with_engine(|engine| {
        engine
            .channel(kind)
            .layer
            .load(&mut dom, &scopes, records)
            .map_err(|e| engine_error("Render error", e))
    })?;
    serialize(&report, "Report serialization error")
}

/// Add the list fetched for a lazily mounted pane and render it there
///
/// Markers already loaded stay in the store; only new records are drawn.
#[wasm_bindgen(js_name = loadPaneMarkers)]
pub fn load_pane_markers(kind: &str, pane: Element, response_js: JsValue) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    let response: ListResponse = from_json(&response_js, "List response error")?;
    let records = response.into_records();
    wasm_log!("loadPaneMarkers: {:?}, {} record(s)", kind, records.len());

    let (mut dom, _) = page()?;
    let scopes: Vec<Node> = vec![pane.into()];
    let report = with_engine(|engine| {
        engine
            .channel(kind)
            .layer
            .merge(&mut dom, &scopes, records)
            .map_err(|e| engine_error("Render error", e))
    })?;
    serialize(&report, "Report serialization error")
}

/// Render stored markers inside a pane that was mounted after load
#[wasm_bindgen(js_name = applyMarkersToPane)]
pub fn apply_markers_to_pane(pane: Element) -> Result<JsValue, JsValue> {
    let (mut dom, _) = page()?;
    let pane: Node = pane.into();
    let report = with_engine(|engine| {
        let annotations = engine
            .annotations
            .layer
            .apply_to_pane(&mut dom, &pane)
            .map_err(|e| engine_error("Render error", e))?;
        let highlights = engine
            .highlights
            .layer
            .apply_to_pane(&mut dom, &pane)
            .map_err(|e| engine_error("Render error", e))?;
        Ok(PaneReport {
            annotations,
            highlights,
        })
    })?;
    serialize(&report, "Report serialization error")
}

/// Encode the current window selection
///
/// Returns the draft when the action button should be shown, `null` when
/// there is nothing to act on or the selection is invalid.
#[wasm_bindgen(js_name = handleSelection)]
pub fn handle_selection(kind: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    let (dom, _) = page()?;

    with_engine(|engine| {
        let Some(selection) = dom.current_selection() else {
            engine.channel(kind).ui.clear_selection();
            return Ok(JsValue::NULL);
        };
        engine.close_others(kind);
        let channel = engine.channel(kind);
        match channel.ui.select(&channel.layer, &dom, &selection) {
            Ok(_) => draft_or_null(channel.ui.state()),
            Err(ControllerError::Selection(reason)) => {
                wasm_log!("handleSelection: rejected ({})", reason);
                Ok(JsValue::NULL)
            }
            Err(err) => Err(controller_error(err)),
        }
    })
}

#[wasm_bindgen(js_name = openCompose)]
pub fn open_compose(kind: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let draft = engine.channel(kind).ui.open_compose().map_err(controller_error)?;
        serialize(draft, "Draft serialization error")
    })
}

/// Save pressed on the compose form; returns the create payload
#[wasm_bindgen(js_name = submitNote)]
pub fn submit_note(kind: &str, note: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let draft = engine.channel(kind).ui.submit_note(note).map_err(controller_error)?;
        serialize(&draft, "Draft serialization error")
    })
}

/// Create payload for a marker kind without notes
#[wasm_bindgen(js_name = quickDraft)]
pub fn quick_draft(kind: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let draft = engine.channel(kind).ui.quick_draft().map_err(controller_error)?;
        serialize(&draft, "Draft serialization error")
    })
}

/// The create request for `draft` returned; render it if it carries an id
#[wasm_bindgen(js_name = commitCreated)]
pub fn commit_created(kind: &str, draft_js: JsValue, response_js: JsValue) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    let draft: MarkerDraft = deserialize(draft_js, "Draft deserialization error")?;
    let response: CreateResponse = from_json(&response_js, "Create response error")?;
    let Some(id) = response.id else {
        wasm_warn!("commitCreated: response carried no id, nothing rendered");
        return Ok(JsValue::NULL);
    };

    let (mut dom, scopes) = page()?;
    let outcome: ApplyOutcome = with_engine(|engine| {
        engine
            .channel(kind)
            .layer
            .commit_created(&mut dom, &scopes, draft, id)
            .map_err(|e| engine_error("Render error", e))
    })?;
    dom.clear_selection();
    serialize(&outcome, "Outcome serialization error")
}

/// A click landed on `node`; open the detail popover of the marker there
///
/// Returns the marker record, or `null` if the click was not on a marker.
#[wasm_bindgen(js_name = openMarkerAt)]
pub fn open_marker_at(kind: &str, node: Node) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    let (dom, _) = page()?;
    with_engine(|engine| {
        let Some(id) = engine.channel(kind).layer.marker_at(&dom, &node) else {
            return Ok(JsValue::NULL);
        };
        engine.close_others(kind);
        let channel = engine.channel(kind);
        channel.ui.open_marker(id.clone());
        match channel.layer.find(&id) {
            Some(record) => serialize(record, "Record serialization error"),
            None => Ok(JsValue::NULL),
        }
    })
}

/// Switch the open popover to its edit form; returns the current note
#[wasm_bindgen(js_name = beginEdit)]
pub fn begin_edit(kind: &str) -> Result<Option<String>, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let channel = engine.channel(kind);
        let id = channel.ui.begin_edit().map_err(controller_error)?.clone();
        Ok(channel.layer.find(&id).and_then(|record| record.comment_text.clone()))
    })
}

/// Cancel pressed; returns the state now shown
#[wasm_bindgen(js_name = cancelMarkerUi)]
pub fn cancel_marker_ui(kind: &str) -> Result<String, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let channel = engine.channel(kind);
        channel.ui.cancel();
        Ok(channel.ui.state().name().to_string())
    })
}

/// Close whatever popover or affordance is open
#[wasm_bindgen(js_name = closeMarkerUi)]
pub fn close_marker_ui(kind: &str) -> Result<(), JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        engine.channel(kind).ui.close();
        Ok(())
    })
}

/// Save pressed on the edit form; returns `{id, url, body}` to PATCH
#[wasm_bindgen(js_name = submitEdit)]
pub fn submit_edit(kind: &str, note: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let (id, payload) = engine.channel(kind).ui.submit_edit(note).map_err(controller_error)?;
        let request = PendingRequest {
            url: engine.config.endpoints(kind).update_url(&id),
            id,
            body: Some(payload),
        };
        serialize(&request, "Request serialization error")
    })
}

/// The update request returned; apply the note if the server confirmed
#[wasm_bindgen(js_name = commitEdited)]
pub fn commit_edited(kind: &str, id: &str, note: &str, response_js: JsValue) -> Result<bool, JsValue> {
    let kind = parse_kind(kind)?;
    let response: UpdateResponse = from_json(&response_js, "Update response error")?;
    if !response.updated {
        wasm_warn!("commitEdited: update of {} not confirmed", id);
        return Ok(false);
    }

    let id = MarkerId::parse(id);
    let note = note.trim();
    with_engine(|engine| {
        let channel = engine.channel(kind);
        channel
            .layer
            .update_note(&id, note)
            .map_err(|e| engine_error("Update error", e))?;
        channel.ui.edit_saved(&id);
        Ok(true)
    })
}

/// Delete pressed; closes the popover and returns `{id, url}` to DELETE
#[wasm_bindgen(js_name = requestDelete)]
pub fn request_delete(kind: &str) -> Result<JsValue, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| {
        let id = engine.channel(kind).ui.request_delete().map_err(controller_error)?;
        let request: PendingRequest<UpdatePayload> = PendingRequest {
            url: engine.config.endpoints(kind).delete_url(&id),
            id,
            body: None,
        };
        serialize(&request, "Request serialization error")
    })
}

/// The delete request returned; unrender the marker if confirmed
#[wasm_bindgen(js_name = commitDeleted)]
pub fn commit_deleted(kind: &str, id: &str, response_js: JsValue) -> Result<bool, JsValue> {
    let kind = parse_kind(kind)?;
    let response: DeleteResponse = from_json(&response_js, "Delete response error")?;
    if !response.deleted {
        wasm_warn!("commitDeleted: delete of {} not confirmed", id);
        return Ok(false);
    }

    let id = MarkerId::parse(id);
    let (mut dom, scopes) = page()?;
    with_engine(|engine| {
        let removed = engine
            .channel(kind)
            .layer
            .remove(&mut dom, &scopes, &id)
            .map_err(|e| engine_error("Unwrap error", e))?;
        Ok(removed.is_some())
    })
}

/// Name of the current UI state, for the host's bookkeeping
#[wasm_bindgen(js_name = markerUiState)]
pub fn marker_ui_state(kind: &str) -> Result<String, JsValue> {
    let kind = parse_kind(kind)?;
    with_engine(|engine| Ok(engine.channel(kind).ui.state().name().to_string()))
}
