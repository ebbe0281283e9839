use crate::extraction::ExtractionResult;
use crate::worker::FileTask;

pub struct TaskContext {
    // Input; `task.kind` is set once classification accepts the file
    pub task: FileTask,

    // Set after step_extract, only for successful extractions
    pub extraction: Option<ExtractionResult>,

    // Set after step_render_prompt
    pub prompt: Option<String>,
}

impl TaskContext {
    pub fn new(task: FileTask) -> Self {
        Self {
            task,
            extraction: None,
            prompt: None,
        }
    }
}
