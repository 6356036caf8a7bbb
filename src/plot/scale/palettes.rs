//! Named palettes and color utilities
//!
//! Colors given by users (`fill`, `color`) accept any CSS color plus the
//! single-letter shorthands common in plotting libraries (`"k"` for black,
//! `"w"` for white, ...). Colormaps (`cmap`) are sampled by interpolating
//! between their stops.

use palette::{FromColor, IntoColor, LinSrgb, Mix, Oklab, Srgb};

use crate::{GgplotError, Result};

// =============================================================================
// Categorical Color Palettes
// =============================================================================

/// Tableau 10 - default categorical palette
pub const TABLEAU10: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f",
    "#edc948", "#b07aa1", "#ff9da7", "#9c755f", "#bab0ac",
];

/// D3 Category 10
pub const CATEGORY10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// ColorBrewer Set1
pub const SET1: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00",
    "#ffff33", "#a65628", "#f781bf", "#999999",
];

/// ColorBrewer Dark2
pub const DARK2: &[&str] = &[
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e",
    "#e6ab02", "#a6761d", "#666666",
];

// =============================================================================
// Sequential Colormaps (stops, interpolated on demand)
// =============================================================================

/// Viridis - default colormap for stacked categories
pub const VIRIDIS: &[&str] = &[
    "#440154", "#482878", "#3e4a89", "#31688e", "#26828e",
    "#1f9e89", "#35b779", "#6ece58", "#b5de2b", "#fde725",
];

/// Plasma
pub const PLASMA: &[&str] = &[
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786",
    "#d8576b", "#ed7953", "#fb9f3a", "#fdca26", "#f0f921",
];

/// Magma
pub const MAGMA: &[&str] = &[
    "#000004", "#180f3d", "#440f76", "#721f81", "#9e2f7f",
    "#cd4071", "#f1605d", "#fd9668", "#feca8d", "#fcfdbf",
];

/// Inferno
pub const INFERNO: &[&str] = &[
    "#000004", "#1b0c41", "#4a0c6b", "#781c6d", "#a52c60",
    "#cf4446", "#ed6925", "#fb9b06", "#f7d13d", "#fcffa4",
];

/// Cividis
pub const CIVIDIS: &[&str] = &[
    "#00224e", "#123570", "#3b496c", "#575d6d", "#707173",
    "#8a8678", "#a59c74", "#c3b369", "#e1cc55", "#fdea45",
];

/// Blues
pub const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6",
    "#4292c6", "#2171b5", "#08519c", "#08306b",
];

/// Name of the colormap used when none is given.
pub const DEFAULT_COLORMAP: &str = "viridis";

// =============================================================================
// Color Utilities
// =============================================================================

/// Expand single-letter color shorthands (`"k"` → `"black"`).
fn expand_shorthand(value: &str) -> &str {
    match value {
        "b" => "#1f77b4",
        "g" => "#2ca02c",
        "r" => "#d62728",
        "c" => "#17becf",
        "m" => "#e377c2",
        "y" => "#bcbd22",
        "k" => "black",
        "w" => "white",
        other => other,
    }
}

/// Convert a color name/value to hex format.
/// Supports named colors (e.g., "red"), hex (#FF0000), rgb(), hsl(), and
/// single-letter shorthands.
pub fn color_to_hex(value: &str) -> Result<String> {
    let value = value.trim();
    csscolorparser::parse(expand_shorthand(value))
        .map(|c| c.to_css_hex())
        .map_err(|e| GgplotError::ValidationError(format!("Invalid color '{}': {}", value, e)))
}

/// Split a color into 8-bit RGB channels.
pub fn color_to_rgb(value: &str) -> Result<(u8, u8, u8)> {
    let parsed = csscolorparser::parse(expand_shorthand(value.trim()))
        .map_err(|e| GgplotError::ValidationError(format!("Invalid color '{}': {}", value, e)))?;
    let [r, g, b, _] = parsed.to_rgba8();
    Ok((r, g, b))
}

/// Look up a colormap by name (case insensitive).
pub fn get_colormap(name: &str) -> Option<&'static [&'static str]> {
    match name.to_lowercase().as_str() {
        "tableau10" | "tableau" => Some(TABLEAU10),
        "category10" | "tab10" => Some(CATEGORY10),
        "set1" => Some(SET1),
        "dark2" => Some(DARK2),
        "viridis" => Some(VIRIDIS),
        "plasma" => Some(PLASMA),
        "magma" => Some(MAGMA),
        "inferno" => Some(INFERNO),
        "cividis" => Some(CIVIDIS),
        "blues" => Some(BLUES),
        _ => None,
    }
}

/// Sample `count` colors spread evenly across a colormap.
pub fn colormap(name: &str, count: usize) -> Result<Vec<String>> {
    let stops = get_colormap(name).ok_or_else(|| {
        GgplotError::ValidationError(format!(
            "Unknown colormap '{}'. Available: tableau10, category10, set1, dark2, viridis, plasma, magma, inferno, cividis, blues",
            name
        ))
    })?;
    interpolate_colors(stops, count)
}

/// Default categorical color for the `index`-th series.
pub fn default_color(index: usize) -> &'static str {
    TABLEAU10[index % TABLEAU10.len()]
}

// =============================================================================
// Color Interpolation
// =============================================================================

/// Interpolate between color stops in Oklab space, returning `count`
/// evenly-spaced hex colors.
///
/// # Example
/// ```
/// use sqlggplot::plot::scale::palettes::interpolate_colors;
///
/// let colors = interpolate_colors(&["red", "blue"], 5).unwrap();
/// assert_eq!(colors.len(), 5);
/// ```
pub fn interpolate_colors(colors: &[&str], count: usize) -> Result<Vec<String>> {
    if colors.is_empty() {
        return Err(GgplotError::InternalError(
            "At least one color is required".to_string(),
        ));
    }
    if count == 0 {
        return Ok(vec![]);
    }

    let srgb_colors: Vec<Srgb<f32>> = colors
        .iter()
        .map(|c| parse_to_srgb(c))
        .collect::<Result<Vec<_>>>()?;

    if srgb_colors.len() == 1 {
        return Ok(vec![srgb_to_hex(&srgb_colors[0]); count]);
    }

    let oklab_colors: Vec<Oklab<f32>> = srgb_colors
        .iter()
        .map(|c| Oklab::from_color(LinSrgb::from(*c)))
        .collect();

    if count == 1 {
        let lin: LinSrgb<f32> = oklab_colors[0].into_color();
        return Ok(vec![srgb_to_hex(&Srgb::from(lin))]);
    }

    let num_segments = oklab_colors.len() - 1;
    let mut result = Vec::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / (count - 1) as f32;
        let segment_float = t * num_segments as f32;
        let segment = (segment_float.floor() as usize).min(num_segments - 1);
        let segment_t = segment_float - segment as f32;

        let interpolated = oklab_colors[segment].mix(oklab_colors[segment + 1], segment_t);
        let lin: LinSrgb<f32> = interpolated.into_color();
        result.push(srgb_to_hex(&Srgb::from(lin)));
    }

    Ok(result)
}

fn parse_to_srgb(color: &str) -> Result<Srgb<f32>> {
    let parsed = csscolorparser::parse(expand_shorthand(color))
        .map_err(|e| GgplotError::ValidationError(format!("Invalid color '{}': {}", color, e)))?;
    Ok(Srgb::new(
        parsed.r as f32,
        parsed.g as f32,
        parsed.b as f32,
    ))
}

fn srgb_to_hex(color: &Srgb<f32>) -> String {
    let r = (color.red.clamp(0.0, 1.0) * 255.0).round() as u8;
    let g = (color.green.clamp(0.0, 1.0) * 255.0).round() as u8;
    let b = (color.blue.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
