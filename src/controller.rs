use hifitime::Epoch;
use log::{debug, info};
use crate::catalog::{ElementCatalog, ElementRecord};
use crate::config::OrbitConfig;
use crate::earth_mesh::EarthMesh;
use crate::error::{OrbitError, Result};
use crate::trajectory::{Trajectory, TrajectorySampler};

/// One generated orbit plot. Dropping the panel releases its surface.
pub(crate) struct PlotPanel<S> {
    title: String,
    trajectory: Trajectory,
    pub(crate) surface: S,
}

impl<S> PlotPanel<S> {
    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

///
/// Application state behind the window: the satellite selection and the stack of open plot
/// panels. Panels are removed most recent first.
///
pub(crate) struct OrbitViewController<S> {
    catalog: ElementCatalog,
    sampler: TrajectorySampler,
    earth_mesh: EarthMesh,
    selection: Option<String>,
    panels: Vec<PlotPanel<S>>,
}

impl<S> OrbitViewController<S> {
    pub(crate) fn new(catalog: ElementCatalog, config: &OrbitConfig) -> OrbitViewController<S> {
        OrbitViewController {
            catalog,
            sampler: TrajectorySampler::from_config(config),
            earth_mesh: EarthMesh::sphere(config.earth_radius_km, config.mesh_resolution),
            selection: None,
            panels: Vec::new(),
        }
    }

    pub(crate) fn select_satellite(&mut self, name: &str) {
        debug!("Selected {name}");
        self.selection = Some(name.to_string());
    }

    /// Selected satellite, falling back to the first catalog entry when nothing was chosen
    pub(crate) fn selected_record(&self) -> Result<&ElementRecord> {
        match self.selection {
            Some(ref name) => self.catalog.get(name).ok_or_else(|| OrbitError::NotFound(name.clone())),
            None => self.catalog.first().ok_or(OrbitError::EmptyCatalog),
        }
    }

    ///
    /// Sample the selected satellite from `start` and open a new panel for it. The surface is only
    /// created once the trajectory is known; on any error no panel is added.
    ///
    pub(crate) fn generate_orbit<F>(&mut self, start: Epoch, create_surface: F) -> Result<&PlotPanel<S>>
    where
        F: FnOnce() -> Result<S>,
    {
        let record = self.selected_record()?;
        let trajectory = self.sampler.sample(record, start)?;
        let title = record.name().to_string();
        let norad_id = record.norad_id();
        let surface = create_surface()?;

        if let Some(current) = trajectory.current() {
            info!("Generated orbit of {title} (NORAD {norad_id}), {} samples, currently {:.0} km from Earth's center",
                  trajectory.samples().len(), current.position.norm());
        }
        self.panels.push(PlotPanel { title, trajectory, surface });
        Ok(&self.panels[self.panels.len() - 1])
    }

    pub(crate) fn remove_orbit(&mut self) -> Option<PlotPanel<S>> {
        let panel = self.panels.pop();
        if let Some(ref panel) = panel {
            info!("Removed orbit of {}", panel.title());
        }
        panel
    }

    pub(crate) fn catalog(&self) -> &ElementCatalog {
        &self.catalog
    }

    pub(crate) fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub(crate) fn earth_mesh(&self) -> &EarthMesh {
        &self.earth_mesh
    }

    pub(crate) fn panels(&self) -> &[PlotPanel<S>] {
        &self.panels
    }

    pub(crate) fn panels_mut(&mut self) -> &mut [PlotPanel<S>] {
        &mut self.panels
    }

    pub(crate) fn panel_count(&self) -> usize {
        self.panels.len()
    }
}


#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use crate::catalog::tests::{synthetic_catalog, synthetic_set};
    use super::*;

    /// Records its own release so tests can observe the removal order
    struct FakeSurface {
        id: usize,
        released: Rc<RefCell<Vec<usize>>>,
    }

    impl Drop for FakeSurface {
        fn drop(&mut self) {
            self.released.borrow_mut().push(self.id);
        }
    }

    fn controller(count: u32) -> OrbitViewController<FakeSurface> {
        OrbitViewController::new(synthetic_catalog(count), &OrbitConfig::default())
    }

    fn start(controller: &OrbitViewController<FakeSurface>) -> Epoch {
        controller.catalog().first().unwrap().epoch()
    }

    #[test]
    fn test_remove_on_empty() {
        let mut controller = controller(3);
        assert!(controller.remove_orbit().is_none());
        assert_eq!(controller.panel_count(), 0);
        assert!(controller.remove_orbit().is_none());
        assert_eq!(controller.panel_count(), 0);
    }

    #[test]
    fn test_generate_then_remove_lifo() {
        let mut controller = controller(5);
        let released = Rc::new(RefCell::new(Vec::new()));
        let start = start(&controller);

        for id in 0..4 {
            controller.select_satellite(&format!("SAT-{id:03}"));
            let surface = FakeSurface { id, released: released.clone() };
            let panel = controller.generate_orbit(start, || Ok(surface)).unwrap();
            assert_eq!(panel.title(), format!("SAT-{id:03}"));
            assert_eq!(panel.trajectory().samples().len(), 90);
        }
        assert_eq!(controller.panel_count(), 4);
        let titles = controller.panels().iter().map(PlotPanel::title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["SAT-000", "SAT-001", "SAT-002", "SAT-003"]);

        for expected in (0..4).rev() {
            let panel = controller.remove_orbit().unwrap();
            assert_eq!(panel.surface.id, expected);
        }
        assert_eq!(controller.panel_count(), 0);
        assert_eq!(*released.borrow(), vec![3, 2, 1, 0]);

        assert!(controller.remove_orbit().is_none());
        assert_eq!(controller.panel_count(), 0);
    }

    #[test]
    fn test_generate_without_selection_uses_first() {
        let mut controller = controller(3);
        let released = Rc::new(RefCell::new(Vec::new()));
        let start = start(&controller);
        assert_eq!(controller.selection(), None);

        let panel = controller.generate_orbit(start, || Ok(FakeSurface { id: 0, released: released.clone() })).unwrap();
        assert_eq!(panel.title(), "SAT-000");
    }

    #[test]
    fn test_unknown_selection() {
        let mut controller = controller(3);
        let start = start(&controller);
        controller.select_satellite("NOT IN CATALOG");
        assert_eq!(controller.selection(), Some("NOT IN CATALOG"));

        let mut created = false;
        let result = controller.generate_orbit(start, || {
            created = true;
            Err(OrbitError::Surface("unused".to_string()))
        });
        assert!(matches!(result, Err(OrbitError::NotFound(ref name)) if name == "NOT IN CATALOG"));
        assert!(!created);
        assert_eq!(controller.panel_count(), 0);
    }

    #[test]
    fn test_empty_catalog() {
        let mut controller: OrbitViewController<FakeSurface> =
            OrbitViewController::new(ElementCatalog::empty(), &OrbitConfig::default());
        let result = controller.generate_orbit(Epoch::from_gregorian_utc(2025, 1, 1, 0, 0, 0, 0),
            || Err(OrbitError::Surface("unused".to_string())));
        assert!(matches!(result, Err(OrbitError::EmptyCatalog)));
        assert_eq!(controller.panel_count(), 0);
    }

    #[test]
    fn test_surface_failure_adds_nothing() {
        let mut controller = controller(2);
        let start = start(&controller);
        let result = controller.generate_orbit(start, || Err(OrbitError::Surface("no GPU".to_string())));
        assert!(matches!(result, Err(OrbitError::Surface(_))));
        assert_eq!(controller.panel_count(), 0);
    }

    #[test]
    fn test_selection_by_display_name() {
        let catalog = ElementCatalog::parse(&[synthetic_set("ALPHA", 1), synthetic_set("BRAVO", 2)].concat()).unwrap();
        let mut controller: OrbitViewController<FakeSurface> = OrbitViewController::new(catalog, &OrbitConfig::default());
        controller.select_satellite("BRAVO");
        assert_eq!(controller.selected_record().unwrap().norad_id(), 2);
        assert_eq!(controller.earth_mesh().resolution(), 100);
    }
}
