//! Scalar-to-colour lookup table.

use once_cell::sync::OnceCell;

use crate::data::array::DataArray;

/// RGBA colour with 8-bit channels.
pub type Rgba = [u8; 4];

/// Linear HSVA ramp sampled into `number_of_colors` entries.
///
/// Defaults follow the classic rainbow: red at the low end of the range,
/// blue at the high end. The table is built on first use and rebuilt after
/// any change to the ramp.
#[derive(Clone, Debug)]
pub struct LookupTable {
    range: [f64; 2],
    hue_range: [f64; 2],
    saturation_range: [f64; 2],
    value_range: [f64; 2],
    alpha_range: [f64; 2],
    number_of_colors: usize,
    nan_color: Rgba,
    table: OnceCell<Vec<Rgba>>,
}

impl Default for LookupTable {
    fn default() -> Self {
        Self {
            range: [0.0, 1.0],
            hue_range: [0.0, 0.66667],
            saturation_range: [1.0, 1.0],
            value_range: [1.0, 1.0],
            alpha_range: [1.0, 1.0],
            number_of_colors: 256,
            nan_color: [128, 0, 0, 255],
            table: OnceCell::new(),
        }
    }
}

fn lerp(r: [f64; 2], t: f64) -> f64 {
    r[0] + t * (r[1] - r[0])
}

fn to_byte(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// HSV in `[0, 1]` to RGB in `[0, 1]`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let (p, q, t) = (v * (1.0 - s), v * (1.0 - s * f), v * (1.0 - s * (1.0 - f)));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn set_range(&mut self, lo: f64, hi: f64) {
        self.range = [lo, hi];
    }

    pub fn set_hue_range(&mut self, lo: f64, hi: f64) {
        self.hue_range = [lo, hi];
        self.table = OnceCell::new();
    }

    pub fn set_saturation_range(&mut self, lo: f64, hi: f64) {
        self.saturation_range = [lo, hi];
        self.table = OnceCell::new();
    }

    pub fn set_value_range(&mut self, lo: f64, hi: f64) {
        self.value_range = [lo, hi];
        self.table = OnceCell::new();
    }

    pub fn set_alpha_range(&mut self, lo: f64, hi: f64) {
        self.alpha_range = [lo, hi];
        self.table = OnceCell::new();
    }

    pub fn number_of_colors(&self) -> usize {
        self.number_of_colors
    }

    pub fn set_number_of_colors(&mut self, n: usize) {
        self.number_of_colors = n.max(1);
        self.table = OnceCell::new();
    }

    pub fn set_nan_color(&mut self, color: Rgba) {
        self.nan_color = color;
    }

    fn table(&self) -> &[Rgba] {
        self.table.get_or_init(|| {
            let n = self.number_of_colors;
            (0..n)
                .map(|i| {
                    let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
                    let [r, g, b] = hsv_to_rgb(
                        lerp(self.hue_range, t),
                        lerp(self.saturation_range, t),
                        lerp(self.value_range, t),
                    );
                    [to_byte(r), to_byte(g), to_byte(b), to_byte(lerp(self.alpha_range, t))]
                })
                .collect()
        })
    }

    /// Colour of scalar `v`; values outside the range clamp to the ends.
    pub fn map_value(&self, v: f64) -> Rgba {
        if v.is_nan() {
            return self.nan_color;
        }
        let table = self.table();
        let [lo, hi] = self.range;
        let index = if hi > lo {
            let t = (v - lo) / (hi - lo);
            ((t * table.len() as f64).floor().max(0.0) as usize).min(table.len() - 1)
        } else {
            0
        };
        table[index]
    }

    /// Colours for every tuple of `array`. `component` selects one
    /// component; `None` maps the magnitude of multi-component tuples.
    pub fn map_array(&self, array: &DataArray, component: Option<usize>) -> Vec<Rgba> {
        (0..array.number_of_tuples())
            .map(|i| {
                let v = match (component, array.number_of_components()) {
                    (Some(c), _) => array.component(i, c).unwrap_or(f64::NAN),
                    (None, 1) => array.component(i, 0).unwrap_or(f64::NAN),
                    (None, _) => array
                        .tuple_f64(i)
                        .map_or(f64::NAN, |t| t.iter().map(|x| x * x).sum::<f64>().sqrt()),
                };
                self.map_value(v)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rainbow_ends() {
        let lut = LookupTable::new();
        assert_eq!(lut.map_value(0.0), [255, 0, 0, 255]);
        let blue = lut.map_value(1.0);
        assert_eq!(blue[2], 255);
        assert_eq!(blue[0], 0);
        assert_eq!(lut.map_value(-5.0), lut.map_value(0.0));
        assert_eq!(lut.map_value(f64::NAN), [128, 0, 0, 255]);
    }

    #[test]
    fn ramp_changes_rebuild_the_table() {
        let mut lut = LookupTable::new();
        assert_eq!(lut.map_value(0.0), [255, 0, 0, 255]);
        lut.set_value_range(0.0, 0.0);
        assert_eq!(lut.map_value(0.0), [0, 0, 0, 255]);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]);
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0).map(|c| (c * 1e9).round()), [0.0, 1e9, 0.0]);
    }
}
