use std::f64::consts::{PI, TAU};

/// Earth-centered position in kilometers
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub(crate) struct GeocentricPosition {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
}

impl GeocentricPosition {
    pub(crate) fn new(x: f64, y: f64, z: f64) -> GeocentricPosition {
        GeocentricPosition {x, y, z}
    }

    pub(crate) fn norm(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

impl From<[f64; 3]> for GeocentricPosition {
    fn from(value: [f64; 3]) -> GeocentricPosition {
        GeocentricPosition::new(value[0], value[1], value[2])
    }
}

///
/// Sphere sampled on a resolution x resolution grid. Rows run over longitude [0, 2π], columns over
/// colatitude [0, π], both endpoints included.
///
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EarthMesh {
    resolution: usize,
    points: Vec<GeocentricPosition>,
}

impl EarthMesh {
    pub(crate) fn sphere(radius: f64, resolution: usize) -> EarthMesh {
        let resolution = resolution.max(2);
        let last = (resolution - 1) as f64;

        let points = (0..resolution)
            .flat_map(|row| (0..resolution).map(move |column| (row, column)))
            .map(|(row, column)| {
                let longitude = TAU * row as f64 / last;
                let colatitude = PI * column as f64 / last;
                GeocentricPosition::new(
                    radius * longitude.cos() * colatitude.sin(),
                    radius * longitude.sin() * colatitude.sin(),
                    radius * colatitude.cos(),
                )
            })
            .collect();

        EarthMesh { resolution, points }
    }

    pub(crate) fn resolution(&self) -> usize {
        self.resolution
    }

    pub(crate) fn point(&self, row: usize, column: usize) -> GeocentricPosition {
        self.points[row * self.resolution + column]
    }

    /// Two triangles per grid cell, counter-clockwise seen from outside the sphere
    pub(crate) fn triangles(&self) -> impl Iterator<Item = [GeocentricPosition; 3]> + '_ {
        let cells = self.resolution - 1;
        (0..cells)
            .flat_map(move |row| (0..cells).map(move |column| (row, column)))
            .flat_map(move |(row, column)| {
                let p00 = self.point(row, column);
                let p01 = self.point(row, column + 1);
                let p10 = self.point(row + 1, column);
                let p11 = self.point(row + 1, column + 1);
                [[p00, p01, p10], [p10, p01, p11]]
            })
    }
}
