use nexusnote_core::{
    format_file_size, Block, BlockContent, BlockList, BlockType, CanvasContent, DragGesture,
    MediaKind, NexusError, Point, PositionChange, TaskListContent,
};
use nexusnote_history::{CanvasState, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

/// Block-list, task and canvas logic for one open page, exposed to JavaScript.
///
/// Methods take and return JSON strings. A failed call returns
/// `{"error": {"code": ..., "message": ...}}` instead of its usual payload.
#[wasm_bindgen]
pub struct NoteEngine {
    blocks: BlockList,
    canvases: HashMap<Uuid, CanvasState>,
    max_snapshots: usize,
}

/// Structured error object for JavaScript
#[derive(Debug, Serialize)]
pub struct JsNoteError {
    code: String,
    message: String,
}

impl From<NexusError> for JsNoteError {
    fn from(err: NexusError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for JsNoteError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            code: "INVALID_JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl JsNoteError {
    fn invalid_id(id: &str) -> Self {
        Self {
            code: "INVALID_ID".to_string(),
            message: format!("'{}' is not a valid id", id),
        }
    }

    fn canvas_not_open(id: Uuid) -> Self {
        Self {
            code: "CANVAS_NOT_OPEN".to_string(),
            message: format!("Canvas {} is not open", id),
        }
    }
}

type EngineResult<T> = Result<T, JsNoteError>;

fn respond<T: Serialize>(result: EngineResult<T>) -> String {
    let body = match result {
        Ok(value) => serde_json::to_string(&value),
        Err(err) => serde_json::to_string(&serde_json::json!({ "error": err })),
    };
    body.unwrap_or_else(|_| "null".to_string())
}

fn parse_id(id: &str) -> EngineResult<Uuid> {
    id.parse().map_err(|_| JsNoteError::invalid_id(id))
}

/// Result of removing a block
#[derive(Serialize)]
pub struct RemovedBlock {
    removed: Block,
    changes: Vec<PositionChange>,
}

/// Outcome of a task edit: the changed field's new value plus the list to save
#[derive(Serialize)]
pub struct TaskEdit<T> {
    value: T,
    content: TaskListContent,
}

/// What the canvas widget needs to repaint
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    #[serde(rename = "dataURL")]
    pub data_url: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl From<&CanvasState> for CanvasView {
    fn from(state: &CanvasState) -> Self {
        Self {
            data_url: state
                .current()
                .and_then(Snapshot::as_data_url)
                .map(str::to_string),
            can_undo: state.can_undo(),
            can_redo: state.can_redo(),
        }
    }
}

#[wasm_bindgen]
impl NoteEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            blocks: BlockList::new(Uuid::nil()),
            canvases: HashMap::new(),
            max_snapshots: nexusnote_history::stack::DEFAULT_MAX_SNAPSHOTS,
        }
    }

    /// Replace the block list with a page's blocks; returns them in order
    #[wasm_bindgen(js_name = loadBlocks)]
    pub fn load_blocks(&mut self, page_id: &str, blocks_json: &str) -> String {
        respond(self.try_load_blocks(page_id, blocks_json))
    }

    #[wasm_bindgen(js_name = getBlocks)]
    pub fn get_blocks(&self) -> String {
        respond(Ok(self.blocks.blocks()))
    }

    /// Blocks as a JS array instead of a JSON string
    #[wasm_bindgen(js_name = getBlocksValue)]
    pub fn get_blocks_value(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.blocks.blocks()).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = blockCount)]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[wasm_bindgen(js_name = isContiguous)]
    pub fn is_contiguous(&self) -> bool {
        self.blocks.is_contiguous()
    }

    /// Append a block returned by the backend
    #[wasm_bindgen(js_name = pushBlock)]
    pub fn push_block(&mut self, block_json: &str) -> String {
        respond(self.try_push_block(block_json))
    }

    /// Move a block; returns every position to write back, `[]` when it stays put
    pub fn reorder(&mut self, from: usize, to: usize) -> String {
        respond(self.blocks.move_block(from, to).map_err(JsNoteError::from))
    }

    /// Indices `[from, to]` for dropping one block onto another, or `null`
    #[wasm_bindgen(js_name = resolveDrop)]
    pub fn resolve_drop(&self, active_id: &str, over_id: &str) -> String {
        respond(self.try_resolve_drop(active_id, over_id))
    }

    /// Remove a block; returns it with the positions that shifted
    #[wasm_bindgen(js_name = removeBlock)]
    pub fn remove_block(&mut self, block_id: &str) -> String {
        respond(self.try_remove_block(block_id))
    }

    #[wasm_bindgen(js_name = setBlockContent)]
    pub fn set_block_content(&mut self, block_id: &str, content_json: &str) -> String {
        respond(self.try_set_block_content(block_id, content_json))
    }

    /// Put back a list captured with `getBlocks`, e.g. after a failed reorder
    #[wasm_bindgen(js_name = restoreBlocks)]
    pub fn restore_blocks(&mut self, snapshot_json: &str) -> String {
        respond(self.try_restore_blocks(snapshot_json))
    }

    // Tasks

    #[wasm_bindgen(js_name = addTask)]
    pub fn add_task(&mut self, block_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| Ok(tasks.add_task())))
    }

    #[wasm_bindgen(js_name = removeTask)]
    pub fn remove_task(&mut self, block_id: &str, task_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| {
            tasks.remove_task(task_id).map(|task| task.id)
        }))
    }

    #[wasm_bindgen(js_name = setTaskText)]
    pub fn set_task_text(&mut self, block_id: &str, task_id: &str, text: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.set_text(task_id, text)))
    }

    #[wasm_bindgen(js_name = setTaskDueDate)]
    pub fn set_task_due_date(&mut self, block_id: &str, task_id: &str, due: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.set_due_date(task_id, due)))
    }

    #[wasm_bindgen(js_name = toggleTaskCompleted)]
    pub fn toggle_task_completed(&mut self, block_id: &str, task_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.toggle_completed(task_id)))
    }

    #[wasm_bindgen(js_name = toggleTaskApproved)]
    pub fn toggle_task_approved(&mut self, block_id: &str, task_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.toggle_approved(task_id)))
    }

    #[wasm_bindgen(js_name = cycleTaskStatus)]
    pub fn cycle_task_status(&mut self, block_id: &str, task_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.cycle_status(task_id)))
    }

    #[wasm_bindgen(js_name = cycleTaskPriority)]
    pub fn cycle_task_priority(&mut self, block_id: &str, task_id: &str) -> String {
        respond(self.edit_tasks(block_id, |tasks| tasks.cycle_priority(task_id)))
    }

    // Canvas

    /// Start drawing history for a canvas block from its saved image
    #[wasm_bindgen(js_name = openCanvas)]
    pub fn open_canvas(&mut self, block_id: &str) -> String {
        respond(self.try_open_canvas(block_id))
    }

    #[wasm_bindgen(js_name = commitStroke)]
    pub fn commit_stroke(&mut self, block_id: &str, data_url: &str) -> String {
        respond(self.with_canvas(block_id, |canvas| {
            canvas.commit_stroke(Snapshot::new(data_url))
        }))
    }

    #[wasm_bindgen(js_name = undoCanvas)]
    pub fn undo_canvas(&mut self, block_id: &str) -> String {
        respond(self.with_canvas(block_id, |canvas| {
            canvas.undo();
        }))
    }

    #[wasm_bindgen(js_name = redoCanvas)]
    pub fn redo_canvas(&mut self, block_id: &str) -> String {
        respond(self.with_canvas(block_id, |canvas| {
            canvas.redo();
        }))
    }

    #[wasm_bindgen(js_name = clearCanvas)]
    pub fn clear_canvas(&mut self, block_id: &str) -> String {
        respond(self.with_canvas(block_id, CanvasState::clear))
    }

    /// Payload to autosave: the image at the history cursor
    #[wasm_bindgen(js_name = canvasContent)]
    pub fn canvas_content(&self, block_id: &str) -> String {
        respond(self.try_canvas_content(block_id))
    }

    /// Drop a canvas's history when its widget unmounts
    #[wasm_bindgen(js_name = closeCanvas)]
    pub fn close_canvas(&mut self, block_id: &str) -> bool {
        parse_id(block_id)
            .map(|id| self.canvases.remove(&id).is_some())
            .unwrap_or(false)
    }
}

impl Default for NoteEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteEngine {
    fn try_load_blocks(&mut self, page_id: &str, blocks_json: &str) -> EngineResult<&[Block]> {
        let page_id = parse_id(page_id)?;
        let blocks: Vec<Block> = serde_json::from_str(blocks_json)?;
        self.blocks = BlockList::from_blocks(page_id, blocks);
        self.canvases.clear();
        Ok(self.blocks.blocks())
    }

    fn try_push_block(&mut self, block_json: &str) -> EngineResult<usize> {
        let block: Block = serde_json::from_str(block_json)?;
        self.blocks.push(block);
        Ok(self.blocks.len())
    }

    fn try_resolve_drop(&self, active_id: &str, over_id: &str) -> EngineResult<Option<(usize, usize)>> {
        Ok(self
            .blocks
            .resolve_drop(parse_id(active_id)?, parse_id(over_id)?))
    }

    fn try_remove_block(&mut self, block_id: &str) -> EngineResult<RemovedBlock> {
        let id = parse_id(block_id)?;
        let (removed, changes) = self.blocks.remove(id)?;
        self.canvases.remove(&id);
        Ok(RemovedBlock { removed, changes })
    }

    fn try_set_block_content(&mut self, block_id: &str, content_json: &str) -> EngineResult<Value> {
        let id = parse_id(block_id)?;
        let kind = self.block_kind(id)?;
        let content: Value = serde_json::from_str(content_json)?;
        // Reject payloads of the wrong shape before storing them
        BlockContent::from_value(kind, &content)?;
        self.blocks.set_content(id, content.clone())?;
        Ok(content)
    }

    fn try_restore_blocks(&mut self, snapshot_json: &str) -> EngineResult<usize> {
        let blocks: Vec<Block> = serde_json::from_str(snapshot_json)?;
        self.blocks.restore(blocks);
        Ok(self.blocks.len())
    }

    fn block_kind(&self, id: Uuid) -> EngineResult<BlockType> {
        self.blocks
            .get(id)
            .map(|b| b.kind)
            .ok_or_else(|| NexusError::BlockNotFound(id).into())
    }

    fn edit_tasks<T>(
        &mut self,
        block_id: &str,
        edit: impl FnOnce(&mut TaskListContent) -> Result<T, NexusError>,
    ) -> EngineResult<TaskEdit<T>> {
        let id = parse_id(block_id)?;
        let block = self.blocks.get(id).ok_or(NexusError::BlockNotFound(id))?;
        let mut tasks = match block.typed_content()? {
            BlockContent::Task(tasks) => tasks,
            other => {
                return Err(NexusError::WrongBlockType {
                    expected: BlockType::Task,
                    found: other.kind(),
                }
                .into())
            }
        };

        let value = edit(&mut tasks)?;
        self.blocks
            .set_content(id, BlockContent::Task(tasks.clone()).to_value())?;
        Ok(TaskEdit {
            value,
            content: tasks,
        })
    }

    fn canvas_block(&self, id: Uuid) -> EngineResult<CanvasContent> {
        let block = self.blocks.get(id).ok_or(NexusError::BlockNotFound(id))?;
        match block.typed_content()? {
            BlockContent::Canvas(content) => Ok(content),
            other => Err(NexusError::WrongBlockType {
                expected: BlockType::Canvas,
                found: other.kind(),
            }
            .into()),
        }
    }

    fn try_open_canvas(&mut self, block_id: &str) -> EngineResult<CanvasView> {
        let id = parse_id(block_id)?;
        let content = self.canvas_block(id)?;
        let state = CanvasState::with_max_snapshots(&content, self.max_snapshots);
        let view = CanvasView::from(&state);
        self.canvases.insert(id, state);
        Ok(view)
    }

    fn with_canvas(
        &mut self,
        block_id: &str,
        f: impl FnOnce(&mut CanvasState),
    ) -> EngineResult<CanvasView> {
        let id = parse_id(block_id)?;
        let canvas = self
            .canvases
            .get_mut(&id)
            .ok_or_else(|| JsNoteError::canvas_not_open(id))?;
        f(canvas);
        Ok(CanvasView::from(&*canvas))
    }

    fn try_canvas_content(&self, block_id: &str) -> EngineResult<CanvasContent> {
        let id = parse_id(block_id)?;
        self.canvases
            .get(&id)
            .map(CanvasState::to_content)
            .ok_or_else(|| JsNoteError::canvas_not_open(id))
    }
}

/// Whether a pointer moved far enough from `start` to begin a drag
#[wasm_bindgen(js_name = isDragActivation)]
pub fn is_drag_activation(start_x: f64, start_y: f64, x: f64, y: f64) -> bool {
    let mut gesture = DragGesture::start(Point::new(start_x, start_y));
    gesture.update(Point::new(x, y))
}

/// `512 B`, `1.5 KB`, `2.0 MB`
#[wasm_bindgen(js_name = formatFileSize)]
pub fn format_size(bytes: f64) -> String {
    format_file_size(bytes.max(0.0) as u64)
}

/// Check a file before upload for a block type; returns `null` when accepted
#[wasm_bindgen(js_name = validateUpload)]
pub fn validate_upload(block_type: &str, mime_type: &str, size: f64) -> String {
    let result = block_type
        .parse::<BlockType>()
        .and_then(|kind| {
            MediaKind::for_block(kind).ok_or(NexusError::UnsupportedOperation {
                kind,
                operation: "upload",
            })
        })
        .and_then(|media| media.validate(mime_type, size.max(0.0) as u64))
        .map_err(JsNoteError::from);
    respond(result)
}
