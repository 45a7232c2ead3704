use tracing::{debug, info, warn};

use crate::config::{LoaderConfig, MountTarget};
use crate::EmbedLoadError;

/// Starts a viewer runtime on a mount target.
///
/// `progress` receives values in `0.0..=1.0` while the runtime loads. The
/// returned instance is the "ready" signal; an error is the "failed" signal.
pub trait EmbedLoader {
    fn load(
        &mut self,
        target: &MountTarget,
        config: &LoaderConfig,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn EmbedInstance>, EmbedLoadError>;
}

/// A running viewer. Owned by an `EmbedSession` until unmount.
pub trait EmbedInstance {
    fn quit(&mut self) -> Result<(), EmbedLoadError>;
}

/// Host notifications while a session mounts.
pub trait EmbedEvents {
    fn on_progress(&mut self, _percent: u8) {}
    fn on_ready(&mut self) {}
    fn on_error(&mut self, _message: &str) {}
}

#[derive(Debug, Default)]
pub struct NoopEvents;

impl EmbedEvents for NoopEvents {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerStatus {
    Idle,
    Loading { percent: u8 },
    Ready,
    Failed(String),
    Unmounted,
}

pub struct EmbedSession {
    target: MountTarget,
    config: LoaderConfig,
    instance: Option<Box<dyn EmbedInstance>>,
    status: ViewerStatus,
}

impl EmbedSession {
    pub fn new(target: MountTarget, config: LoaderConfig) -> Self {
        Self {
            target,
            config,
            instance: None,
            status: ViewerStatus::Idle,
        }
    }

    pub fn target(&self) -> &MountTarget {
        &self.target
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    /// Loads the viewer once. Mounting an already running session is a
    /// no-op; a failed load is reported, not retried.
    pub fn mount<L>(&mut self, loader: &mut L, events: &mut dyn EmbedEvents)
    where
        L: EmbedLoader + ?Sized,
    {
        if self.instance.is_some() {
            debug!(canvas = %self.target.canvas_id, "viewer already mounted");
            return;
        }

        self.status = ViewerStatus::Loading { percent: 0 };
        let mut last_percent = 0u8;
        let result = {
            let status = &mut self.status;
            let mut on_progress = |fraction: f32| {
                let percent = progress_percent(fraction);
                if percent != last_percent {
                    last_percent = percent;
                    *status = ViewerStatus::Loading { percent };
                    events.on_progress(percent);
                }
            };
            loader.load(&self.target, &self.config, &mut on_progress)
        };

        match result {
            Ok(instance) => {
                info!(canvas = %self.target.canvas_id, "viewer ready");
                self.instance = Some(instance);
                self.status = ViewerStatus::Ready;
                events.on_ready();
            }
            Err(err) => {
                warn!(canvas = %self.target.canvas_id, error = %err, "viewer failed to load");
                let message = err.to_string();
                events.on_error(&message);
                self.status = ViewerStatus::Failed(message);
            }
        }
    }

    /// Message to show in place of the viewer, if any.
    pub fn status_line(&self) -> Option<String> {
        match &self.status {
            ViewerStatus::Idle => Some("Loading viewer... 0%".to_string()),
            ViewerStatus::Loading { percent } => Some(format!("Loading viewer... {percent}%")),
            ViewerStatus::Failed(message) => Some(format!("Error loading viewer: {message}")),
            ViewerStatus::Ready | ViewerStatus::Unmounted => None,
        }
    }

    /// Asks the running instance to quit. Teardown errors are swallowed.
    pub fn unmount(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            if let Err(err) = instance.quit() {
                debug!(error = %err, "ignoring viewer teardown failure");
            }
        }
        self.status = ViewerStatus::Unmounted;
    }
}

impl Drop for EmbedSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn progress_percent(fraction: f32) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ScriptedLoader {
        steps: Vec<f32>,
        fail_with: Option<String>,
        quit_fails: bool,
        loads: u32,
        quits: Rc<RefCell<u32>>,
    }

    impl ScriptedLoader {
        fn new(steps: Vec<f32>) -> Self {
            Self {
                steps,
                fail_with: None,
                quit_fails: false,
                loads: 0,
                quits: Rc::new(RefCell::new(0)),
            }
        }
    }

    struct ScriptedInstance {
        fails: bool,
        quits: Rc<RefCell<u32>>,
    }

    impl EmbedInstance for ScriptedInstance {
        fn quit(&mut self) -> Result<(), EmbedLoadError> {
            *self.quits.borrow_mut() += 1;
            if self.fails {
                Err(EmbedLoadError::Teardown("runtime already gone".into()))
            } else {
                Ok(())
            }
        }
    }

    impl EmbedLoader for ScriptedLoader {
        fn load(
            &mut self,
            _target: &MountTarget,
            _config: &LoaderConfig,
            progress: &mut dyn FnMut(f32),
        ) -> Result<Box<dyn EmbedInstance>, EmbedLoadError> {
            self.loads += 1;
            for step in &self.steps {
                progress(*step);
            }
            if let Some(message) = &self.fail_with {
                return Err(EmbedLoadError::Startup(message.clone()));
            }
            Ok(Box::new(ScriptedInstance {
                fails: self.quit_fails,
                quits: Rc::clone(&self.quits),
            }))
        }
    }

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u8>,
        ready: bool,
        errors: Vec<String>,
    }

    impl EmbedEvents for Recorder {
        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn on_ready(&mut self) {
            self.ready = true;
        }

        fn on_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn session() -> EmbedSession {
        EmbedSession::new(
            MountTarget::default(),
            LoaderConfig::from_build("/unity/Build", "buildteste"),
        )
    }

    #[test]
    fn reports_progress_then_ready() {
        let mut loader = ScriptedLoader::new(vec![0.1, 0.1, 0.456, 1.0, 1.7]);
        let mut events = Recorder::default();
        let mut session = session();
        session.mount(&mut loader, &mut events);

        assert_eq!(events.progress, vec![10, 46, 100]);
        assert!(events.ready);
        assert_eq!(session.status(), &ViewerStatus::Ready);
        assert_eq!(session.status_line(), None);
        assert!(session.is_running());
    }

    #[test]
    fn mount_is_idempotent_while_running() {
        let mut loader = ScriptedLoader::new(vec![1.0]);
        let mut session = session();
        session.mount(&mut loader, &mut NoopEvents);
        session.mount(&mut loader, &mut NoopEvents);
        assert_eq!(loader.loads, 1);
    }

    #[test]
    fn load_failure_is_surfaced_not_retried() {
        let mut loader = ScriptedLoader::new(vec![0.3]);
        loader.fail_with = Some("wasm streaming compile failed".into());
        let mut events = Recorder::default();
        let mut session = session();
        session.mount(&mut loader, &mut events);

        assert_eq!(events.errors.len(), 1);
        assert!(!session.is_running());
        let line = session.status_line().unwrap();
        assert!(line.starts_with("Error loading viewer:"));
        assert!(line.contains("wasm streaming compile failed"));
        assert_eq!(loader.loads, 1);
    }

    #[test]
    fn unmount_requests_quit_once_and_swallows_errors() {
        let mut loader = ScriptedLoader::new(vec![1.0]);
        loader.quit_fails = true;
        let quits = Rc::clone(&loader.quits);
        let mut session = session();
        session.mount(&mut loader, &mut NoopEvents);

        session.unmount();
        session.unmount();
        assert_eq!(*quits.borrow(), 1);
        assert_eq!(session.status(), &ViewerStatus::Unmounted);
        drop(session);
        assert_eq!(*quits.borrow(), 1);
    }

    #[test]
    fn dropping_a_running_session_quits_the_instance() {
        let mut loader = ScriptedLoader::new(vec![]);
        let quits = Rc::clone(&loader.quits);
        {
            let mut session = session();
            session.mount(&mut loader, &mut NoopEvents);
        }
        assert_eq!(*quits.borrow(), 1);
    }

    #[test]
    fn progress_is_clamped_to_percent() {
        assert_eq!(progress_percent(-0.5), 0);
        assert_eq!(progress_percent(0.994), 99);
        assert_eq!(progress_percent(0.996), 100);
        assert_eq!(progress_percent(f32::NAN), 0);
    }
}
