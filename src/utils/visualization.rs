//! Visualization utilities for rust_mpc2d
//!
//! Renders a recorded [`History`] with gnuplot. Purely a consumer of the
//! history: nothing here feeds back into the control loop.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{MpcError, MpcResult, Pose2D, PredictedTrajectory};
use crate::control::History;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const MAGENTA: &str = "#FF00FF";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const TRAJECTORY: &str = BLUE;
    pub const PREDICTION: &str = RED;
    pub const VEHICLE: &str = BLACK;
    pub const REFERENCE: &str = MAGENTA;
    pub const START: &str = GREEN;
    pub const THROTTLE: &str = "#35C788";
    pub const STEER: &str = "#DD3355";
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::TRAJECTORY, "Trajectory")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

/// gnuplot figure with the run's trajectory, predictions and goals.
///
/// Series are buffered and drawn onto one set of axes when the figure is
/// rendered.
pub struct Visualizer {
    figure: Figure,
    series: Vec<Series>,
    title: String,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            series: Vec::new(),
            title: String::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines { x: x.to_vec(), y: y.to_vec(), style: style.clone() });
        self
    }

    pub fn plot_point(&mut self, x: f64, y: f64, style: &PointStyle) -> &mut Self {
        self.series.push(Series::Points { x: vec![x], y: vec![y], style: style.clone() });
        self
    }

    /// Pose as a point with a heading stroke
    pub fn plot_pose(&mut self, pose: &Pose2D, length: f64, style: &PointStyle) -> &mut Self {
        self.plot_point(pose.x, pose.y, style);
        let end_x = pose.x + length * pose.yaw.cos();
        let end_y = pose.y + length * pose.yaw.sin();
        let stroke = PathStyle::new(&style.color, "");
        self.plot_path_xy(&[pose.x, end_x], &[pose.y, end_y], &stroke)
    }

    pub fn plot_prediction(&mut self, prediction: &PredictedTrajectory, caption: &str) -> &mut Self {
        let style = PathStyle::new(colors::PREDICTION, caption).with_line_width(1.0);
        self.plot_path_xy(&prediction.x_coords(), &prediction.y_coords(), &style)
    }

    /// Applied trajectory, every `prediction_every`-th prediction, the
    /// distinct references and the final vehicle pose
    pub fn plot_history(&mut self, history: &History, prediction_every: usize) -> &mut Self {
        self.plot_path_xy(&history.x_coords(), &history.y_coords(), &PathStyle::default());

        if prediction_every > 0 {
            let mut caption = "Prediction";
            for entry in history.iter().skip(1).step_by(prediction_every) {
                self.plot_prediction(&entry.prediction, caption);
                caption = "";
            }
        }

        let mut references: Vec<Pose2D> = Vec::new();
        for entry in history.iter() {
            if references.last() != Some(&entry.reference) {
                references.push(entry.reference);
            }
        }
        for (i, reference) in references.iter().enumerate() {
            let caption = format!("Reference {}", i + 1);
            let style = PointStyle::new(colors::REFERENCE, &caption).with_size(2.0);
            self.plot_pose(reference, 1.0, &style);
        }

        let seed = history.seed().state;
        self.plot_point(seed.x, seed.y, &PointStyle::new(colors::START, "Start").with_size(1.5));
        let last = history.last().state.pose();
        let style = PointStyle::new(colors::VEHICLE, "Vehicle").with_symbol('*').with_size(2.0);
        self.plot_pose(&last, 1.0, &style)
    }

    pub fn save_svg(&mut self, path: &str, width: u32, height: u32) -> MpcResult<()> {
        self.render();
        self.figure
            .save_to_svg(path, width, height)
            .map_err(|e| MpcError::Visualization(e.to_string()))
    }

    pub fn show(&mut self) -> MpcResult<()> {
        self.render();
        self.figure
            .show()
            .map(|_| ())
            .map_err(|e| MpcError::Visualization(e.to_string()))
    }

    fn render(&mut self) {
        self.figure.clear_axes();
        let axes = self.figure.axes2d();

        for series in &self.series {
            match series {
                Series::Lines { x, y, style } => {
                    axes.lines(
                        x,
                        y,
                        &[Caption(&style.caption), Color(&style.color), LineWidth(style.line_width)],
                    );
                }
                Series::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(&style.caption),
                            Color(&style.color),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("x [m]", &[]);
        axes.set_y_label("y [m]", &[]);

        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plot of the applied controls over time, throttle and steering
pub fn plot_controls(history: &History, dt: f64) -> Figure {
    let t: Vec<f64> = history.iter().map(|e| e.tick as f64 * dt).collect();
    let accel: Vec<f64> = history.iter().map(|e| e.control.accel).collect();
    let steer: Vec<f64> = history.iter().map(|e| e.control.steer).collect();

    let mut fig = Figure::new();
    fig.axes2d()
        .set_title("Applied controls", &[])
        .set_x_label("t [s]", &[])
        .lines(&t, &accel, &[Caption("accel [m/s^2]"), Color(colors::THROTTLE)])
        .lines(&t, &steer, &[Caption("steer [rad]"), Color(colors::STEER)]);
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_style() {
        let style = PathStyle::new(colors::RED, "Test Path").with_line_width(3.0);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(style.color, colors::RED);
    }

    #[test]
    fn test_plot_history_buffers_series() {
        use crate::common::{Reference, State};
        use crate::control::HistoryEntry;

        let history = History::new(HistoryEntry::seed(State::origin(), Reference::new(10.0, 10.0, 0.0)));
        let mut vis = Visualizer::new();
        vis.plot_history(&history, 5);
        // trajectory, reference point + stroke, start, vehicle point + stroke
        assert_eq!(vis.series_count(), 6);
    }

    #[test]
    fn test_point_style_builder() {
        let style = PointStyle::new(colors::VEHICLE, "Vehicle").with_symbol('*').with_size(2.0);
        assert_eq!(style.symbol, '*');
        assert_eq!(style.size, 2.0);
    }
}
