use std::ops::Range;

use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::palette::{parse_color, viridis};
use super::scene::{BarFill, DrawCommand, RasterScene};
use super::RasterOptions;

const TEXT: RGBColor = WHITE;
const DEFAULT_LINE_COLOR: RGBColor = RGBColor(0, 255, 159);
const GLOW_WIDTH: f64 = 5.0;
const GLOW_ALPHA: f64 = 0.3;
const GRID_ALPHA: f64 = 0.2;

/// Resolution and font settings shared by every element on the canvas.
struct Theme {
    dpi: u32,
    background: RGBColor,
    font_family: String,
}

impl Theme {
    /// Points to pixels.
    fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn font(&self, points: f64) -> TextStyle<'_> {
        (self.font_family.as_str(), self.px(points)).into_font().color(&TEXT)
    }

    fn stroke(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }
}

/// Dark themed bitmap canvas for the legacy PNG output
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    theme: Theme,
}

impl Canvas {
    pub fn new(options: &RasterOptions) -> Result<Self> {
        if options.width == 0 || options.height == 0 {
            anyhow::bail!("Cannot create canvas of size {}x{}", options.width, options.height);
        }
        let background = parse_color(&options.background_color)
            .with_context(|| format!("Invalid background color '{}'", options.background_color))?;

        let size = (options.width as usize)
            .checked_mul(options.height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .with_context(|| format!("Canvas of size {}x{} is too large", options.width, options.height))?;

        Ok(Canvas {
            buffer: vec![0u8; size],
            width: options.width,
            height: options.height,
            theme: Theme {
                dpi: options.dpi.max(1),
                background,
                font_family: options.font_family.clone(),
            },
        })
    }

    /// Draw the whole scene onto the buffer
    pub fn draw(&mut self, scene: &RasterScene) -> Result<()> {
        let primary = scene
            .value_ranges
            .first()
            .cloned()
            .context("Scene has no value axis")?;
        let secondary = scene.value_ranges.get(1).cloned();
        let theme = &self.theme;

        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&theme.background).context("Failed to fill background")?;

        let y_area = theme.px(45.0) as u32;
        let label_area = theme.px(if scene.rotate_labels { 60.0 } else { 30.0 }) as u32;
        let title_style = (theme.font_family.as_str(), theme.px(16.0))
            .into_font()
            .style(FontStyle::Bold)
            .color(&TEXT);

        let mut chart = ChartBuilder::on(&root)
            .margin(theme.px(10.0) as u32)
            .caption(&scene.title, title_style)
            .x_label_area_size(label_area)
            .y_label_area_size(y_area)
            .right_y_label_area_size(if secondary.is_some() { y_area } else { 0 })
            .build_cartesian_2d(scene.x_range(), primary.clone())
            .context("Failed to build chart")?
            .set_secondary_coord(scene.x_range(), secondary.clone().unwrap_or_else(|| primary.clone()));

        // Only integer ticks carry a category name
        let categories = scene.categories.clone();
        let x_label_style = if scene.rotate_labels {
            theme.font(10.0).transform(FontTransform::Rotate90)
        } else {
            theme.font(10.0)
        };

        chart
            .configure_mesh()
            .x_labels(scene.categories.len())
            .x_label_formatter(&|x| {
                let rounded = x.round();
                if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
                    return String::new();
                }
                categories.get(rounded as usize).cloned().unwrap_or_default()
            })
            .x_label_style(x_label_style)
            .y_label_style(theme.font(10.0))
            .x_desc(scene.x_label.as_str())
            .y_desc(scene.axis_labels[0].as_str())
            .axis_desc_style(theme.font(12.0))
            .axis_style(TEXT.stroke_width(1))
            .bold_line_style(TEXT.mix(GRID_ALPHA).stroke_width(1))
            .light_line_style(TRANSPARENT.stroke_width(0))
            .draw()
            .context("Failed to draw mesh")?;

        if secondary.is_some() {
            chart
                .configure_secondary_axes()
                .y_desc(scene.axis_labels[1].as_str())
                .label_style(theme.font(10.0))
                .axis_desc_style(theme.font(12.0))
                .axis_style(TEXT.stroke_width(1))
                .draw()
                .context("Failed to draw secondary axis")?;
        }

        // Secondary axis values are drawn in primary coordinates
        let to_primary = |axis: usize, y: f64| match (&secondary, axis) {
            (Some(range), 1) => rescale(y, range, &primary),
            _ => y,
        };

        let edge = WHITE.stroke_width(theme.stroke(0.5));
        let value_style = theme.font(9.0).pos(Pos::new(HPos::Center, VPos::Bottom));
        let marker_size = theme.px(3.0).max(2.0) as i32;

        for command in &scene.commands {
            match command {
                DrawCommand::DrawBar {
                    tl, br, value, axis, style, legend,
                } => {
                    let color = match &style.fill {
                        BarFill::Gradient(t) => viridis(*t),
                        BarFill::Solid(c) => parse_color(c).unwrap_or(DEFAULT_LINE_COLOR),
                    };
                    let corners = [
                        (tl.0, to_primary(*axis, tl.1)),
                        (br.0, to_primary(*axis, br.1)),
                    ];

                    let drawn = chart
                        .draw_series([
                            Rectangle::new(corners, color.mix(style.alpha).filled()),
                            Rectangle::new(corners, edge),
                        ])
                        .context("Failed to draw bar")?;
                    if let Some(name) = legend {
                        drawn
                            .label(name.as_str())
                            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
                    }

                    chart
                        .draw_series(std::iter::once(Text::new(
                            format_value(*value),
                            ((tl.0 + br.0) / 2.0, to_primary(*axis, *value)),
                            value_style.clone(),
                        )))
                        .context("Failed to draw value label")?;
                }
                DrawCommand::DrawLine {
                    points, axis, style, legend,
                } => {
                    let color = parse_color(&style.color).unwrap_or(DEFAULT_LINE_COLOR);
                    let mapped: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x, to_primary(*axis, y))).collect();

                    chart
                        .draw_series(LineSeries::new(
                            mapped.clone(),
                            color.mix(GLOW_ALPHA).stroke_width(theme.stroke(GLOW_WIDTH)),
                        ))
                        .context("Failed to draw line glow")?;
                    let drawn = chart
                        .draw_series(LineSeries::new(mapped.clone(), color.stroke_width(theme.stroke(style.width))))
                        .context("Failed to draw line series")?;
                    if let Some(name) = legend {
                        drawn
                            .label(name.as_str())
                            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                    }

                    let s = marker_size;
                    match style.marker.as_deref().map(str::trim) {
                        Some("s") | Some("square") => chart.draw_series(
                            mapped
                                .iter()
                                .map(|&p| EmptyElement::at(p) + Rectangle::new([(-s, -s), (s, s)], color.filled())),
                        ),
                        Some("^") | Some("triangle") => chart.draw_series(
                            mapped
                                .iter()
                                .map(|&p| EmptyElement::at(p) + TriangleMarker::new((0, 0), s, color.filled())),
                        ),
                        _ => chart.draw_series(
                            mapped
                                .iter()
                                .map(|&p| EmptyElement::at(p) + Circle::new((0, 0), s, color.filled())),
                        ),
                    }
                    .context("Failed to draw markers")?;

                    chart
                        .draw_series(
                            points
                                .iter()
                                .zip(&mapped)
                                .map(|(&(_, y), &at)| Text::new(format_value(y), at, value_style.clone())),
                        )
                        .context("Failed to draw value labels")?;
                }
            }
        }

        if scene.has_legend() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(theme.font(10.0))
                .background_style(theme.background.mix(0.8).filled())
                .border_style(TEXT.mix(GRID_ALPHA).stroke_width(1))
                .draw()
                .context("Failed to draw legend")?;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&self.buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Map `y` from one axis range onto another.
fn rescale(y: f64, from: &Range<f64>, to: &Range<f64>) -> f64 {
    let span = from.end - from.start;
    if span == 0.0 {
        return to.start;
    }
    to.start + (y - from.start) / span * (to.end - to.start)
}

/// Value labels drop a trailing `.0`.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(1.5), "1.50");
    }

    #[test]
    fn test_rescale_between_axes() {
        assert_eq!(rescale(5.0, &(0.0..10.0), &(0.0..100.0)), 50.0);
        assert_eq!(rescale(0.0, &(-1.0..1.0), &(0.0..20.0)), 10.0);
        assert_eq!(rescale(3.0, &(2.0..2.0), &(7.0..9.0)), 7.0);
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let options = RasterOptions {
            width: 0,
            ..RasterOptions::default()
        };
        assert!(Canvas::new(&options).is_err());
    }

    #[test]
    fn test_rejects_overflowing_canvas() {
        let options = RasterOptions {
            width: u32::MAX,
            height: u32::MAX,
            ..RasterOptions::default()
        };
        let err = Canvas::new(&options).err().unwrap();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_rejects_bad_background() {
        let options = RasterOptions {
            background_color: "not-a-color".to_string(),
            ..RasterOptions::default()
        };
        assert!(Canvas::new(&options).is_err());
    }
}
