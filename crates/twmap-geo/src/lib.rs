//! Boundary geometry for the choropleth.
//!
//! [`GeometryResolver::load_geometry`] fetches a source, rejects anything that
//! is not structurally a geometry document (error pages, wrong content type,
//! arbitrary JSON) and decodes it into [`RegionGeometry`] values. GeoJSON
//! FeatureCollections are read directly; TopoJSON objects are reconstructed
//! from shared arcs once per payload and object, then served from cache.
//!
//! Feature properties are kept as the source spells them. A
//! [`DisplayNameAdapter`], selected by [`NameField`] in configuration, reads
//! the display name at join time.
//!
//! [`RegionGeometry`]: twmap_model::RegionGeometry

mod error;
mod geojson;
mod name;
mod payload;
mod resolver;
mod topology;

pub use error::{GeometryError, Result};
pub use name::{ConcatName, DisplayNameAdapter, NameField, PropertyName};
pub use payload::{GeoPayload, validate_payload};
pub use resolver::{GeometryResolver, GeometrySource, TopologyKey};
