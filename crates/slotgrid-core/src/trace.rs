use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Page,
    Lines,
    Columns,
    Rows,
    TimeModel,
    Blocks,
    Anchor,
    Snap,
    Fields,
    Guard,
    Assemble,
}

impl TraceStage {
    fn tag(self) -> &'static str {
        match self {
            TraceStage::Page => "PAGE",
            TraceStage::Lines => "LINE",
            TraceStage::Columns => "COL",
            TraceStage::Rows => "ROW",
            TraceStage::TimeModel => "MAP",
            TraceStage::Blocks => "BLOCK",
            TraceStage::Anchor => "ANCHOR",
            TraceStage::Snap => "SNAP",
            TraceStage::Fields => "FIELD",
            TraceStage::Guard => "GUARD",
            TraceStage::Assemble => "ASSEMBLE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub page_number: usize,
    pub stage: TraceStage,
    pub message: String,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage.tag(), self.message)
    }
}

/// Ordered record of which fallback fired at each stage, for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticTrace {
    pub trace_schema_version: String,
    pub events: Vec<TraceEvent>,
}

impl Default for DiagnosticTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            events: Vec::new(),
        }
    }
}

impl DiagnosticTrace {
    pub fn push(&mut self, page_number: usize, stage: TraceStage, message: impl Into<String>) {
        let event = TraceEvent {
            page_number,
            stage,
            message: message.into(),
        };
        tracing::debug!(page = page_number, "{}", event);
        self.events.push(event);
    }

    /// Append another trace, keeping order.
    pub fn extend(&mut self, other: DiagnosticTrace) {
        self.events.extend(other.events);
    }

    /// Rendered strings, pages separated by a `---` line.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.events.len());
        let mut page = None;
        for event in &self.events {
            if page.is_some() && page != Some(event.page_number) {
                out.push("---".to_string());
            }
            page = Some(event.page_number);
            out.push(event.to_string());
        }
        out
    }

    pub fn stage_events(&self, stage: TraceStage) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(move |e| e.stage == stage)
    }
}

/// Page-scoped writer so stage code doesn't thread page numbers around.
pub struct PageTrace<'a> {
    page_number: usize,
    trace: &'a mut DiagnosticTrace,
}

impl<'a> PageTrace<'a> {
    pub fn new(page_number: usize, trace: &'a mut DiagnosticTrace) -> Self {
        Self { page_number, trace }
    }

    pub fn note(&mut self, stage: TraceStage, message: impl Into<String>) {
        self.trace.push(self.page_number, stage, message);
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_render_tags_and_page_breaks() {
        let mut trace = DiagnosticTrace::default();
        trace.push(1, TraceStage::Columns, "strategy=grid-lines");
        trace.push(1, TraceStage::Rows, "strategy=fallback");
        trace.push(2, TraceStage::Guard, "insufficient bands");
        assert_eq!(
            trace.lines(),
            vec![
                "[COL] strategy=grid-lines",
                "[ROW] strategy=fallback",
                "---",
                "[GUARD] insufficient bands",
            ]
        );
    }

    #[test]
    fn page_trace_stamps_page_number() {
        let mut trace = DiagnosticTrace::default();
        {
            let mut page = PageTrace::new(3, &mut trace);
            page.note(TraceStage::Blocks, "comps=0");
        }
        assert_eq!(trace.events[0].page_number, 3);
        assert_eq!(trace.stage_events(TraceStage::Blocks).count(), 1);
    }
}
