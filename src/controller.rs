//! Routes presentation-layer requests to the operations.
//!
//! Every request runs under one guard: a failure of any kind is logged and
//! turned into [`Response::Error`], so the caller always gets a notice
//! instead of an error value.
//!
//! A clean request stays suspended until the processing context answers.
//! Because `handle` holds the controller mutably while it waits, replies
//! are delivered through the shared bridge returned by
//! [`Controller::bridge`] (or through `handle` on another controller
//! sharing it).

use std::sync::Arc;

use futures::channel::mpsc::UnboundedReceiver;

use crate::bridge::{BridgeEvent, ProcessRequest, ProcessingBridge};
use crate::config::Settings;
use crate::error::LocframeError;
use crate::export;
use crate::import;
use crate::matcher;
use crate::protocol::{Request, Response};
use crate::scene::Document;
use crate::session::Session;

pub struct Controller<D: Document> {
    doc: D,
    session: Session,
    bridge: Arc<ProcessingBridge>,
    settings: Settings,
}

impl<D: Document> Controller<D> {
    /// Creates a controller over `doc` and the receiver the processing
    /// context reads requests from.
    pub fn new(doc: D, settings: Settings) -> (Self, UnboundedReceiver<ProcessRequest>) {
        let (bridge, requests) = ProcessingBridge::channel();
        let controller = Self {
            doc,
            session: Session::new(),
            bridge: Arc::new(bridge),
            settings,
        };
        (controller, requests)
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    pub fn bridge(&self) -> Arc<ProcessingBridge> {
        Arc::clone(&self.bridge)
    }

    /// Handles one request.
    ///
    /// Replies from the processing context produce no response.
    pub async fn handle(&mut self, request: Request) -> Option<Response> {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "request failed");
                Some(Response::error(e.to_string()))
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> Result<Option<Response>, LocframeError> {
        let response = match request {
            Request::ScanSelection { selection } => {
                Response::ScanComplete(self.session.scan(&self.doc, &selection)?)
            }
            Request::CleanImage { options } => {
                let report = self
                    .session
                    .clean(&mut self.doc, &self.bridge, options)
                    .await?;
                Response::CleanSuccess {
                    node: report.node,
                    message: report.message,
                }
            }
            Request::ImageProcessed { bytes } => {
                self.bridge.deliver(BridgeEvent::Processed(bytes));
                return Ok(None);
            }
            Request::ImageProcessError { message } => {
                self.bridge.deliver(BridgeEvent::ProcessError(message));
                return Ok(None);
            }
            Request::ScanFrames => {
                let page = self.doc.current_page();
                Response::FramesScanned {
                    frames: matcher::find_localization_frames(&self.doc, page)?,
                }
            }
            Request::ExportImages { options } => {
                let report = export::export_images(&mut self.doc, &options)?;
                Response::ExportReady {
                    exported_count: report.exported_count,
                    files: report.files,
                    failures: report.failures,
                }
            }
            Request::ImportLocalization { rows, options } => {
                let report = import::import_rows(&mut self.doc, &rows, &options, &self.settings)?;
                Response::ImportSuccess {
                    main_frame: report.main_frame,
                    message: report.message(),
                }
            }
        };
        Ok(Some(response))
    }
}
