use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};

// =============================================================================
// Scales
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64), // Data min/max after padding
    pub is_categorical: bool,
    pub ticks: Vec<Tick>, // If categorical, the only labelled positions
}

// =============================================================================
// Scene Graph
// =============================================================================

/// A list of primitive drawing commands.
/// The Backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub nrow: usize,
    pub ncol: usize,
    pub panels: Vec<PanelScene>,
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
        legend: Option<String>,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        sizes: Vec<f64>, // Marker diameter per point, in pixels
        style: PointStyle,
        legend: Option<String>,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        style: BarStyle,
        legend: Option<String>,
    },
    DrawText {
        text: String,
        at: (f64, f64),
        style: LabelStyle,
    },
}
