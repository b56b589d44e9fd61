//! In-memory pedal and keyboard doubles for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::error::DeviceError;
use crate::input::{EventSource, KeyState, RawEvent};
use crate::output::KeySink;

/// One write observed on a `MockSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    Key(u16, KeyState),
    Sync,
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub writes: Vec<Written>,
    pub closes: usize,
}

pub struct MockSink {
    name: String,
    log: Rc<RefCell<SinkLog>>,
    closed: bool,
    fail_writes: bool,
}

impl MockSink {
    pub fn new(name: &str) -> (Self, Rc<RefCell<SinkLog>>) {
        let log = Rc::new(RefCell::new(SinkLog::default()));
        let sink = Self {
            name: name.to_string(),
            log: Rc::clone(&log),
            closed: false,
            fail_writes: false,
        };
        (sink, log)
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    fn check(&self) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed {
                device: self.name.clone(),
            });
        }
        if self.fail_writes {
            return Err(DeviceError::Write {
                device: self.name.clone(),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            });
        }
        Ok(())
    }
}

impl KeySink for MockSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_key(&mut self, code: u16, state: KeyState) -> Result<(), DeviceError> {
        self.check()?;
        self.log.borrow_mut().writes.push(Written::Key(code, state));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), DeviceError> {
        self.check()?;
        self.log.borrow_mut().writes.push(Written::Sync);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed {
                device: self.name.clone(),
            });
        }
        self.closed = true;
        self.log.borrow_mut().closes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SourceLog {
    pub grabs: usize,
    pub ungrabs: usize,
    pub reads: usize,
}

/// Pedal double fed with queued read results, one per `read_events` call
pub struct MockSource {
    name: String,
    reads: VecDeque<Result<Vec<RawEvent>, io::ErrorKind>>,
    log: Rc<RefCell<SourceLog>>,
    grabbed: bool,
    fail_grab: bool,
    fail_ungrab: bool,
}

impl MockSource {
    pub fn new(name: &str) -> (Self, Rc<RefCell<SourceLog>>) {
        let log = Rc::new(RefCell::new(SourceLog::default()));
        let source = Self {
            name: name.to_string(),
            reads: VecDeque::new(),
            log: Rc::clone(&log),
            grabbed: false,
            fail_grab: false,
            fail_ungrab: false,
        };
        (source, log)
    }

    /// Queue the events returned by the next read
    pub fn with_batch(mut self, events: Vec<RawEvent>) -> Self {
        self.reads.push_back(Ok(events));
        self
    }

    /// Queue a read failure
    pub fn with_read_error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(Err(kind));
        self
    }

    pub fn failing_grab(mut self) -> Self {
        self.fail_grab = true;
        self
    }

    pub fn failing_ungrab(mut self) -> Self {
        self.fail_ungrab = true;
        self
    }
}

impl EventSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab(&mut self) -> Result<(), DeviceError> {
        if self.fail_grab {
            return Err(DeviceError::Grab {
                device: self.name.clone(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.log.borrow_mut().grabs += 1;
        self.grabbed = true;
        Ok(())
    }

    fn ungrab(&mut self) -> Result<(), DeviceError> {
        self.log.borrow_mut().ungrabs += 1;
        if self.fail_ungrab {
            return Err(DeviceError::Ungrab {
                device: self.name.clone(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        self.grabbed = false;
        Ok(())
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn read_events(&mut self) -> Result<Vec<RawEvent>, DeviceError> {
        self.log.borrow_mut().reads += 1;
        match self.reads.pop_front() {
            None => Ok(Vec::new()),
            Some(Ok(events)) => Ok(events),
            Some(Err(kind)) => Err(DeviceError::Read {
                device: self.name.clone(),
                source: io::Error::from(kind),
            }),
        }
    }
}

/// Events a USB foot switch reports for one physical transition:
/// scan code, key event, sync report
pub fn pedal_report(code: u16, state: KeyState) -> Vec<RawEvent> {
    vec![
        RawEvent::new(0x04, 0x04, 0x7001e),
        RawEvent::key(code, state),
        RawEvent::new(0x00, 0, 0),
    ]
}

/// Handler that ignores the event
pub fn noop(
    _output: &mut dyn KeySink,
    _source: &dyn EventSource,
    _event: &RawEvent,
) -> Result<(), DeviceError> {
    Ok(())
}
