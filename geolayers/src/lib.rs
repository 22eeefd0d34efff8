//! # geolayers
//!
//! Moteur d'ingestion de géométries et de rendu par couches pour des
//! enregistrements géospatiaux hétérogènes (arbres, segments, polygones)
//! stockés sous des schémas libres.
//!
//! ## Features
//!
//! - Extraction de géométrie sans schéma fixe, ordre des axes corrigé
//! - Style par état sanitaire (sain / élagage / risque) et par type de couche
//! - Clustering des couches ponctuelles quand la surface le permet
//! - Registre des couches et visibilité par couche et par élément
//! - Chargements estampillés par génération : les réponses obsolètes sont ignorées
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geolayers::{ElementBuilder, ClusterAggregator, FitOptions, LayerRegistry, Session};
//!
//! let registry = LayerRegistry::new(ElementBuilder::default(), ClusterAggregator::default());
//! let mut session = Session::new(surface, registry, FitOptions::default());
//!
//! let load = session.open_project(&source, Some(project)).await?;
//! for (layer, outcome) in &load.outcomes {
//!     println!("{}: {:?}", layer.name, outcome);
//! }
//! session.set_element_visible("12", "12-3", false);
//! ```

pub mod cluster;
pub mod element;
pub mod error;
pub mod extract;
pub mod fields;
pub mod registry;
pub mod session;
pub mod source;
pub mod style;
pub mod surface;
pub mod types;
pub mod visibility;

pub use cluster::{ClusterAggregator, ClusterIcon, ClusterOptions, GroupKind};
pub use element::{BuildOutcome, Element, ElementBuilder, InfoPanel, Primitive, SkipReason};
pub use error::LayerError;
pub use extract::{AxisStrategy, GeometryExtractor};
pub use fields::FieldCatalog;
pub use registry::{LayerRegistry, LoadStats, VisualGroup};
pub use session::{Generation, LoadOutcome, LoadTicket, ProjectLoad, Session};
pub use source::DataSource;
pub use style::{Palette, StatusClass, StatusKeywords, StyleResolver};
pub use surface::{FitOptions, MapSurface};
pub use types::{Geometry, Layer, LayerKind, Project, RawRecord};
pub use visibility::{LayerToggle, VisibilityController, VisibilityState};
