#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quire_notify::{ChannelListener, Event, ExecutionScope, ListenerId};
use quire_output::OutputShape;
use quire_params::{ImageFormat, OperationKind, Rotation, Source, SourceLocation, TaskParameters};
use quire_service::{ServiceConfig, TaskExecutionService};
use quire_task::{
  Document, DocumentBackend, DocumentError, ExecutionError, SaveOptions, Task, TaskContext,
  TaskRegistry, ValidationError,
};
use tokio::sync::mpsc;

/// Pages are labels `p1..pN`; an inline source's bytes are the page count.
#[derive(Debug, Clone)]
pub struct FakeDocument {
  pages: Vec<String>,
  renders: Arc<AtomicUsize>,
}

impl Document for FakeDocument {
  fn page_count(&self) -> u32 {
    self.pages.len() as u32
  }

  fn rotate_page(&mut self, page: u32, rotation: Rotation) -> Result<(), DocumentError> {
    let label = self
      .pages
      .get_mut(page as usize - 1)
      .ok_or(DocumentError::NoSuchPage { page })?;
    label.push_str(&format!("r{}", rotation.degrees()));
    Ok(())
  }

  fn extract(&self, pages: &[u32]) -> Result<Box<dyn Document>, DocumentError> {
    let pages = pages
      .iter()
      .map(|p| self.pages[*p as usize - 1].clone())
      .collect();
    Ok(Box::new(FakeDocument {
      pages,
      renders: Arc::clone(&self.renders),
    }))
  }

  fn append(&mut self, other: &dyn Document) -> Result<(), DocumentError> {
    let text = String::from_utf8(other.save(&SaveOptions::default())?).unwrap();
    self.pages.extend(text.split(',').map(str::to_string));
    Ok(())
  }

  fn render_page(&self, page: u32, format: ImageFormat) -> Result<Vec<u8>, DocumentError> {
    self.renders.fetch_add(1, Ordering::SeqCst);
    Ok(format!("{} image of {}", format.extension(), self.pages[page as usize - 1]).into_bytes())
  }

  fn save(&self, _options: &SaveOptions) -> Result<Vec<u8>, DocumentError> {
    Ok(self.pages.join(",").into_bytes())
  }

  fn extension(&self) -> &'static str {
    "fake"
  }
}

#[derive(Debug, Default)]
pub struct FakeBackend {
  pub renders: Arc<AtomicUsize>,
}

impl DocumentBackend for FakeBackend {
  fn open(&self, source: &Source) -> Result<Box<dyn Document>, DocumentError> {
    if source.password.as_deref() == Some("wrong") {
      return Err(DocumentError::WrongPassword);
    }
    let SourceLocation::Inline { bytes } = &source.location else {
      return Err(DocumentError::Unsupported {
        operation: "file sources",
      });
    };
    let count: u32 = String::from_utf8_lossy(bytes).parse().unwrap();
    Ok(Box::new(FakeDocument {
      pages: (1..=count).map(|n| format!("p{}", n)).collect(),
      renders: Arc::clone(&self.renders),
    }))
  }
}

pub fn source(pages: u32, name: &str) -> Source {
  Source::inline(name, pages.to_string())
}

pub fn service(config: ServiceConfig, registry: TaskRegistry) -> Arc<TaskExecutionService> {
  Arc::new(TaskExecutionService::new(config, Arc::new(registry)).unwrap())
}

pub fn fake_service(config: ServiceConfig) -> (Arc<TaskExecutionService>, Arc<AtomicUsize>) {
  let backend = FakeBackend::default();
  let renders = Arc::clone(&backend.renders);
  (service(config, TaskRegistry::standard(Arc::new(backend))), renders)
}

/// Attach a channel listener to `scope`.
pub fn watch(scope: &ExecutionScope, id: &str) -> mpsc::UnboundedReceiver<Event> {
  let (tx, rx) = mpsc::unbounded_channel();
  scope.add_listener(Arc::new(ChannelListener::new(ListenerId::new(id), tx)));
  rx
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

pub fn terminal(events: &[Event]) -> Vec<&Event> {
  events.iter().filter(|e| e.is_terminal()).collect()
}

pub fn zip_entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
  let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
  (0..archive.len())
    .map(|i| {
      let mut file = archive.by_index(i).unwrap();
      let mut content = Vec::new();
      file.read_to_end(&mut content).unwrap();
      (file.name().to_string(), content)
    })
    .collect()
}

/// Where a [`RecordingTask`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
  Nowhere,
  Validation,
  Execution,
  /// Panics in `execute` after staging its outputs.
  Panic,
}

/// Stages `outputs` with progress after each, recording every hook it runs.
pub struct RecordingTask {
  pub outputs: Vec<&'static str>,
  pub fail_at: FailAt,
  pub hooks: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Task for RecordingTask {
  fn output_shape(&self) -> OutputShape {
    OutputShape::Multiple
  }

  async fn before_execute(&mut self, _params: &TaskParameters) -> Result<(), ValidationError> {
    self.hooks.lock().unwrap().push("before");
    if self.fail_at == FailAt::Validation {
      return Err(ValidationError::NoSources);
    }
    Ok(())
  }

  async fn execute(
    &mut self,
    _params: &TaskParameters,
    cx: &mut TaskContext,
  ) -> Result<(), ExecutionError> {
    self.hooks.lock().unwrap().push("execute");
    for (idx, name) in self.outputs.iter().enumerate() {
      cx.stage_bytes(*name, name.as_bytes())?;
      cx.step(idx + 1, self.outputs.len());
      tokio::task::yield_now().await;
    }
    match self.fail_at {
      FailAt::Execution => Err(ExecutionError::NotValidated),
      FailAt::Panic => panic!("page tree is corrupt"),
      _ => Ok(()),
    }
  }

  async fn after_execute(&mut self) {
    self.hooks.lock().unwrap().push("after");
  }
}

/// A registry whose merge slot runs a [`RecordingTask`].
pub fn recording_registry(
  outputs: Vec<&'static str>,
  fail_at: FailAt,
) -> (TaskRegistry, Arc<Mutex<Vec<&'static str>>>) {
  let hooks = Arc::new(Mutex::new(Vec::new()));
  let recorded = Arc::clone(&hooks);
  let registry = TaskRegistry::standard(Arc::new(FakeBackend::default())).with(
    OperationKind::Merge,
    move || {
      Box::new(RecordingTask {
        outputs: outputs.clone(),
        fail_at,
        hooks: Arc::clone(&hooks),
      })
    },
  );
  (registry, recorded)
}
