//! Session cartographique : projet actif, générations de chargement, ajustement de vue
//!
//! Chaque changement de projet incrémente la génération. Un chargement démarré
//! sous une génération n'est appliqué que si elle est toujours active : une
//! réponse tardive d'un projet précédent est ignorée au lieu de repeupler une
//! couche déjà vidée.

use futures::stream::{FuturesUnordered, StreamExt};
use geo::Rect;
use tracing::{debug, error, info};

use crate::registry::{LayerRegistry, LoadStats};
use crate::source::DataSource;
use crate::surface::{FitOptions, MapSurface};
use crate::types::{Layer, Project, RawRecord};
use crate::visibility::{LayerToggle, VisibilityController};
use crate::LayerError;

/// Jeton de génération, monotone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Chargement en cours d'une couche, estampillé par la génération de départ
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: Generation,
    layer: Layer,
}

impl LoadTicket {
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Issue de l'application d'un chargement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Couche reconstruite ; `added == 0` signifie chargée vide
    Loaded(LoadStats),
    /// Erreur d'accès aux données : cette couche seulement n'est pas chargée
    Failed(LayerError),
    /// Réponse arrivée après un changement de projet, ignorée
    Stale,
    /// Couche désactivée pendant le chargement, réponse ignorée
    Disabled,
}

/// Bilan de l'ouverture d'un projet
#[derive(Debug, Clone)]
pub struct ProjectLoad {
    pub generation: Generation,
    /// Une entrée par couche, dans l'ordre de la source
    pub outcomes: Vec<(Layer, LoadOutcome)>,
    /// Emprise sur laquelle la vue a été ajustée
    pub bounds: Option<Rect>,
}

/// État cartographique d'une session applicative
#[derive(Debug)]
pub struct Session<M> {
    surface: M,
    registry: LayerRegistry,
    visibility: VisibilityController,
    fit: FitOptions,
    generation: Generation,
    project: Option<Project>,
    layers: Vec<Layer>,
}

impl<M: MapSurface> Session<M> {
    pub fn new(surface: M, registry: LayerRegistry, fit: FitOptions) -> Self {
        Self {
            surface,
            registry,
            visibility: VisibilityController::default(),
            fit,
            generation: Generation::default(),
            project: None,
            layers: Vec::new(),
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }

    pub fn into_surface(self) -> M {
        self.surface
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn visibility(&self) -> &VisibilityController {
        &self.visibility
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Couches du projet actif
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Change de projet : nouvelle génération, registre et visibilité vidés
    pub fn select_project(&mut self, project: Option<Project>) -> Generation {
        self.generation = self.generation.next();
        self.registry
            .reset(&mut self.surface, project.as_ref().map(|p| p.id.clone()));
        self.visibility.reset();
        self.layers.clear();
        info!(
            project = project.as_ref().map(|p| p.id.as_str()).unwrap_or("-"),
            generation = self.generation.0,
            "Project selected"
        );
        self.project = project;
        self.generation
    }

    /// Enregistre la liste des couches si la génération est toujours active
    pub fn set_layers(&mut self, generation: Generation, layers: Vec<Layer>) -> bool {
        if generation != self.generation {
            debug!(generation = generation.0, "Stale layer list ignored");
            return false;
        }
        self.layers = layers;
        true
    }

    pub fn begin_load(&self, layer_id: &str) -> Result<LoadTicket, LayerError> {
        let layer = self
            .layers
            .iter()
            .find(|l| l.id == layer_id)
            .cloned()
            .ok_or_else(|| LayerError::UnknownLayer(layer_id.to_string()))?;
        Ok(LoadTicket {
            generation: self.generation,
            layer,
        })
    }

    /// Applique le résultat d'un chargement, sauf s'il est devenu obsolète
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<RawRecord>, LayerError>,
    ) -> LoadOutcome {
        let layer_id = ticket.layer.id.as_str();
        let relevant = ticket.generation == self.generation
            && self.layers.iter().any(|l| l.id == layer_id);
        if !relevant {
            debug!(layer_id, generation = ticket.generation.0, "Stale load completion dropped");
            return LoadOutcome::Stale;
        }
        if !self.visibility.is_layer_enabled(layer_id) {
            debug!(layer_id, "Layer disabled during load, completion dropped");
            return LoadOutcome::Disabled;
        }

        match result {
            Ok(records) => {
                self.visibility.layer_reloaded(layer_id);
                let stats = self
                    .registry
                    .load_layer(&mut self.surface, &ticket.layer, records);
                LoadOutcome::Loaded(stats)
            }
            Err(e) => {
                error!(layer_id, error = %e, "Layer load failed");
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Ajuste la vue sur l'emprise de toutes les couches posées
    pub fn fit_to_loaded(&mut self) -> Option<Rect> {
        let bounds = self.registry.aggregate_bounds()?;
        self.surface.fit_bounds(bounds, &self.fit);
        Some(bounds)
    }

    /// Sélectionne un projet, charge toutes ses couches actives, puis ajuste la
    /// vue une fois tous les chargements terminés
    ///
    /// # Errors
    ///
    /// Seul l'échec de la liste des couches est remonté ; un échec de couche
    /// est rapporté dans [`ProjectLoad::outcomes`].
    pub async fn open_project<S: DataSource>(
        &mut self,
        source: &S,
        project: Option<Project>,
    ) -> Result<ProjectLoad, LayerError> {
        let generation = self.select_project(project);
        let Some(project_id) = self.project.as_ref().map(|p| p.id.clone()) else {
            return Ok(ProjectLoad {
                generation,
                outcomes: Vec::new(),
                bounds: None,
            });
        };

        let layers = source.layers(&project_id).await?;
        info!(project = %project_id, layers = layers.len(), "Layers fetched");
        self.set_layers(generation, layers);

        let tickets: Vec<LoadTicket> = self
            .layers
            .iter()
            .filter(|l| self.visibility.is_layer_enabled(&l.id))
            .map(|layer| LoadTicket {
                generation,
                layer: layer.clone(),
            })
            .collect();

        let outcomes = self.run_loads(source, tickets).await;
        let bounds = self.fit_to_loaded();

        Ok(ProjectLoad {
            generation,
            outcomes,
            bounds,
        })
    }

    /// Lance les requêtes ensemble et applique chaque réponse à son arrivée
    async fn run_loads<S: DataSource>(
        &mut self,
        source: &S,
        tickets: Vec<LoadTicket>,
    ) -> Vec<(Layer, LoadOutcome)> {
        let mut pending: FuturesUnordered<_> = tickets
            .into_iter()
            .enumerate()
            .map(|(position, ticket)| async move {
                let result = source.layer_records(ticket.layer()).await;
                (position, ticket, result)
            })
            .collect();

        let mut outcomes = Vec::new();
        while let Some((position, ticket, result)) = pending.next().await {
            let layer = ticket.layer.clone();
            let outcome = self.complete_load(ticket, result);
            outcomes.push((position, layer, outcome));
        }

        outcomes.sort_by_key(|(position, _, _)| *position);
        outcomes
            .into_iter()
            .map(|(_, layer, outcome)| (layer, outcome))
            .collect()
    }

    /// Active ou désactive une couche ; l'activation recharge ses données
    ///
    /// Retourne `None` quand la couche est masquée.
    pub async fn set_layer_visible<S: DataSource>(
        &mut self,
        source: &S,
        layer_id: &str,
        visible: bool,
    ) -> Result<Option<LoadOutcome>, LayerError> {
        let toggle = self.visibility.set_layer_visible(
            &mut self.registry,
            &mut self.surface,
            layer_id,
            visible,
        );
        match toggle {
            LayerToggle::Hidden => Ok(None),
            LayerToggle::ReloadRequired => {
                let ticket = self.begin_load(layer_id)?;
                let result = source.layer_records(ticket.layer()).await;
                Ok(Some(self.complete_load(ticket, result)))
            }
        }
    }

    pub fn set_element_visible(&mut self, layer_id: &str, element_id: &str, visible: bool) -> bool {
        self.visibility.set_element_visible(
            &mut self.registry,
            &mut self.surface,
            layer_id,
            element_id,
            visible,
        )
    }
}
