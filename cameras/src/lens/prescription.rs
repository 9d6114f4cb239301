//! Lens Prescription

use super::surface::*;
use crate::error::*;
use crate::parser::*;
use lens_core::pbrt::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts rays traced through the lens stack and rays lost to vignetting.
/// Counts only ever grow.
#[derive(Debug, Default)]
pub struct RayCounters {
    traced: AtomicU64,
    vignetted: AtomicU64,
}

impl RayCounters {
    /// Record one ray passing through the lens stack.
    pub fn record_traced(&self) {
        self.traced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one ray blocked by the lens stack.
    pub fn record_vignetted(&self) {
        self.vignetted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of rays traced.
    pub fn traced(&self) -> u64 {
        self.traced.load(Ordering::Relaxed)
    }

    /// Returns the number of rays vignetted.
    pub fn vignetted(&self) -> u64 {
        self.vignetted.load(Ordering::Relaxed)
    }
}

/// A sequence of lens surfaces stored rear to front; index 0 is the surface
/// nearest the sensor. Built once and only read while tracing.
#[derive(Debug)]
pub struct LensPrescription {
    /// Surfaces ordered from the sensor towards the scene.
    surfaces: Vec<LensSurface>,

    /// Axial distance from the sensor plane to the aperture stop in mm.
    aperture_distance: Float,

    /// Radius of the opening of the aperture stop in mm.
    stop_radius: Float,

    /// How far calibration moved the sensor plane towards the lens in mm.
    image_shift: Float,

    /// Ray counters.
    counters: RayCounters,
}

impl LensPrescription {
    /// Create a new `LensPrescription` from surfaces listed front to back, the
    /// order used in lens tables.
    ///
    /// * `front_to_back` - Surfaces starting with the one facing the scene.
    pub fn new(front_to_back: Vec<LensSurface>) -> Result<Self, LensError> {
        if front_to_back.is_empty() {
            return Err(LensError::Empty(String::from("<prescription>")));
        }

        info!("Lens prescription (radius, thickness, IOR, aperture):");
        for surface in front_to_back.iter() {
            info!("  {}", surface);
        }

        let mut surfaces = front_to_back;
        surfaces.reverse();

        let mut prescription = Self {
            surfaces,
            aperture_distance: 0.0,
            stop_radius: 0.0,
            image_shift: 0.0,
            counters: RayCounters::default(),
        };

        if let Some(stop) = prescription.stop_index() {
            prescription.aperture_distance = prescription.distance_to(stop);
            prescription.stop_radius = prescription.surfaces[stop].aperture_radius;
        }

        Ok(prescription)
    }

    /// Load a lens prescription from a tabular lens file.
    ///
    /// * `path` - Path to the lens file.
    pub fn read(path: &str) -> Result<Self, LensError> {
        info!("Loading lens prescription '{}'", path);
        Self::new(parse_lens_file(path)?)
    }

    /// Returns the surfaces ordered from the sensor towards the scene.
    pub fn surfaces(&self) -> &[LensSurface] {
        &self.surfaces
    }

    /// Returns the axial distance from the sensor plane to the aperture stop.
    pub fn aperture_distance(&self) -> Float {
        self.aperture_distance
    }

    /// Returns the radius of the opening of the aperture stop.
    pub fn stop_radius(&self) -> Float {
        self.stop_radius
    }

    /// Returns how far calibration moved the sensor plane.
    pub fn image_shift(&self) -> Float {
        self.image_shift
    }

    /// Returns the ray counters.
    pub fn counters(&self) -> &RayCounters {
        &self.counters
    }

    /// Returns the index of the aperture stop nearest the sensor.
    pub fn stop_index(&self) -> Option<usize> {
        self.surfaces.iter().position(|s| s.is_aperture_stop())
    }

    /// Returns the axial position of every surface vertex measured from the
    /// sensor plane.
    pub fn vertex_positions(&self) -> Vec<Float> {
        self.surfaces
            .iter()
            .scan(0.0, |z, s| {
                *z += s.thickness;
                Some(*z)
            })
            .collect()
    }

    /// Set the opening of the aperture stop. Values larger than the stop's
    /// clear aperture are clamped.
    ///
    /// * `radius` - Requested stop radius in mm.
    pub fn set_stop_radius(&mut self, radius: Float) -> Result<(), LensError> {
        let stop = self.stop_index().ok_or(LensError::NoApertureStop)?;
        let limit = self.surfaces[stop].aperture_radius;
        self.stop_radius = if radius > limit {
            warn!(
                "Aperture stop radius {} exceeds the clear aperture {}. Clamping.",
                radius, limit
            );
            limit
        } else {
            radius
        };
        Ok(())
    }

    /// Move the sensor plane so that an on-axis object at the given distance
    /// is in focus and return the shift. The aperture-stop distance is
    /// recomputed for the moved sensor.
    ///
    /// * `object_distance` - Distance of the object from the sensor in mm.
    pub fn calibrate(&mut self, object_distance: Float) -> Result<Float, LensError> {
        let stop = self.stop_index().ok_or(LensError::NoApertureStop)?;
        let shift = self.image_distance(object_distance)?;
        self.surfaces[0].thickness -= shift;
        self.image_shift += shift;
        self.aperture_distance = self.distance_to(stop);

        info!(
            "Calibrated lens for {} mm: image shift {} mm, aperture stop at {} mm",
            object_distance, shift, self.aperture_distance
        );

        Ok(shift)
    }

    /// Returns the axial position of the vertex of a surface.
    ///
    /// * `index` - Index of the surface.
    fn distance_to(&self, index: usize) -> Float {
        self.surfaces[..=index].iter().map(|s| s.thickness).sum()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use std::fs;

    fn write_lens(name: &str, text: &str) -> String {
        let path = std::env::temp_dir().join(format!("{}-{}.dat", name, std::process::id()));
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_and_reverses_table() {
        let path = write_lens(
            "prescription-three",
            "# radius\tthickness\tior\taperture\n\
             35.0\t5.0\t1.5\t20.0\n\
             0\t4.0\t0.0\t12.0\n\
             -40.0\t50.0\t1.0\t18.0\n",
        );
        let lens = LensPrescription::read(&path).unwrap();
        let _ = fs::remove_file(&path);

        let surfaces = lens.surfaces();
        assert_eq!(surfaces.len(), 3);
        assert_eq!(surfaces[0].radius(), -40.0);
        assert_eq!(surfaces[1].shape, SurfaceShape::ApertureStop);
        assert_eq!(surfaces[1].eta, 1.0);
        assert_eq!(surfaces[2].radius(), 35.0);

        assert_eq!(lens.stop_index(), Some(1));
        assert_eq!(lens.aperture_distance(), 54.0);
        assert_eq!(lens.stop_radius(), 6.0);
        assert_eq!(lens.vertex_positions(), vec![50.0, 54.0, 59.0]);
    }

    #[test]
    fn empty_prescription_is_rejected() {
        assert!(matches!(
            LensPrescription::new(vec![]),
            Err(LensError::Empty(_))
        ));
    }

    #[test]
    fn stop_radius_is_clamped() {
        let mut lens = LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::ApertureStop, 10.0, 1.0, 5.0),
        ])
        .unwrap();

        lens.set_stop_radius(2.0).unwrap();
        assert_eq!(lens.stop_radius(), 2.0);

        lens.set_stop_radius(8.0).unwrap();
        assert_eq!(lens.stop_radius(), 5.0);
    }

    #[test]
    fn calibrate_without_stop_fails() {
        let mut lens = LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Spherical { radius: 50.0 }, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Spherical { radius: -50.0 }, 100.0, 1.0, 10.0),
        ])
        .unwrap();

        assert!(matches!(
            lens.set_stop_radius(1.0),
            Err(LensError::NoApertureStop)
        ));
        assert!(matches!(
            lens.calibrate(3000.0),
            Err(LensError::NoApertureStop)
        ));

        // A failed calibration leaves the sensor where it was.
        assert_eq!(lens.surfaces()[0].thickness, 100.0);
        assert_eq!(lens.image_shift(), 0.0);
    }

    #[test]
    fn calibrate_moves_sensor() {
        let mut lens = LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Spherical { radius: 50.0 }, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Spherical { radius: -50.0 }, 2.0, 1.0, 10.0),
            LensSurface::new(SurfaceShape::ApertureStop, 100.0, 1.0, 8.0),
        ])
        .unwrap();
        let rear_thickness = lens.surfaces()[0].thickness;

        let shift = lens.calibrate(3000.0).unwrap();
        assert!(approx_eq!(
            f64,
            lens.surfaces()[0].thickness,
            rear_thickness - shift,
            epsilon = 1e-12
        ));
        assert_eq!(lens.image_shift(), shift);
        assert!(approx_eq!(
            f64,
            lens.aperture_distance(),
            100.0 - shift,
            epsilon = 1e-9
        ));
    }
}
