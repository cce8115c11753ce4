//! Per-resource query builders.
//!
//! Each builder fixes the collection path and paging mode of one endpoint
//! and adds the field vocabulary that endpoint understands. Everything
//! else is delegated to [`EntityQueryBuilder`].

use std::sync::Arc;

use crate::api::query::Direction;
use crate::api::query::EntityQuery;
use crate::api::query::EntityQueryBuilder;
use crate::api::query::Envelope;
use crate::api::query::OrderBy;
use crate::api::query::QValue;
use crate::api::query::RecordProcessor;
use crate::error::Error;
use crate::model::Record;
use crate::transport::RestConnection;

/// Path of the application version collection.
pub const APPLICATION_VERSIONS_PATH: &str = "/api/v1/projectVersions";

/// Path template of the application an application version belongs to.
pub const APPLICATION_URI_TEMPLATE: &str = "/api/v1/projects/${project.id}";

/// Path of the FoD release collection.
pub const RELEASES_PATH: &str = "/api/v3/releases";

/// Path template of the FoD application a release belongs to.
pub const RELEASE_APPLICATION_URI_TEMPLATE: &str = "/api/v3/applications/${applicationId}";

/// Default separator between application and version name.
pub const DEFAULT_NAME_SEPARATOR: &str = ":";

/// An identifier given either as id or as `<application><sep><version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrId {
    /// A plain id.
    Id(String),
    /// Application name and version name.
    Names(String, String),
}

/// Splits `input` on `separator`.
///
/// One part is an id, two parts are application and version name. Anything
/// else is a configuration error.
///
/// # Example
///
/// ```
/// use fortify_lib::api::{split_name_or_id, NameOrId};
///
/// assert_eq!(split_name_or_id("42", ":").unwrap(), NameOrId::Id("42".into()));
/// assert_eq!(
///     split_name_or_id("WebGoat:5.0", ":").unwrap(),
///     NameOrId::Names("WebGoat".into(), "5.0".into())
/// );
/// assert!(split_name_or_id("a:b:c", ":").is_err());
/// ```
pub fn split_name_or_id(input: &str, separator: &str) -> Result<NameOrId, Error> {
    if input.is_empty() {
        return Err(Error::configuration("application version name or id is empty"));
    }
    if separator.is_empty() {
        return Ok(NameOrId::Id(input.to_string()));
    }

    let parts: Vec<&str> = input.split(separator).collect();
    match parts.as_slice() {
        [id] => Ok(NameOrId::Id(id.to_string())),
        [application, version] => Ok(NameOrId::Names(application.to_string(), version.to_string())),
        _ => Err(Error::configuration(format!(
            "'{}' must be either an id or <application>{}<version>",
            input, separator
        ))),
    }
}

macro_rules! delegate_to_builder {
    ($name:ident) => {
        impl $name {
            fn map(self, f: impl FnOnce(EntityQueryBuilder) -> EntityQueryBuilder) -> Self {
                Self {
                    builder: f(self.builder),
                }
            }

            /// Adds an AND-ed `field:value` predicate.
            pub fn q_and(self, field: impl Into<String>, value: impl Into<QValue>) -> Self {
                self.map(|b| b.q_and(field, value))
            }

            /// Selects the fields to return.
            pub fn fields<I, S>(self, fields: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.map(|b| b.fields(fields))
            }

            /// Adds an arbitrary query parameter.
            pub fn param(self, name: impl Into<String>, value: impl Into<String>) -> Self {
                self.map(|b| b.param(name, value))
            }

            /// Caps the number of records returned.
            pub fn max_results(self, max_results: usize) -> Self {
                self.map(|b| b.max_results(max_results))
            }

            /// Attaches a lazily loaded property to every record.
            pub fn on_demand(self, name: impl Into<String>, uri_template: impl Into<String>) -> Self {
                self.map(|b| b.on_demand(name, uri_template))
            }

            /// Returns the underlying generic builder.
            pub fn into_builder(self) -> EntityQueryBuilder {
                self.builder
            }

            /// Builds the executable query.
            pub fn build(&self) -> EntityQuery {
                self.builder.build()
            }

            /// See [`EntityQuery::process_all`].
            pub async fn process_all<P>(&self, processor: &mut P) -> Result<(), Error>
            where
                P: RecordProcessor + ?Sized,
            {
                self.builder.process_all(processor).await
            }

            /// See [`EntityQuery::get_all`].
            pub async fn get_all(&self) -> Result<Vec<Record>, Error> {
                self.builder.get_all().await
            }

            /// See [`EntityQuery::get_unique`].
            pub async fn get_unique(&self) -> Result<Option<Record>, Error> {
                self.builder.get_unique().await
            }
        }
    };
}

/// Query for application versions.
#[derive(Debug, Clone)]
pub struct ApplicationVersionsQuery {
    builder: EntityQueryBuilder,
}

delegate_to_builder!(ApplicationVersionsQuery);

impl ApplicationVersionsQuery {
    /// Creates a query over all application versions.
    pub fn new(connection: Arc<dyn RestConnection>) -> Self {
        Self {
            builder: EntityQueryBuilder::new(connection, APPLICATION_VERSIONS_PATH),
        }
    }

    /// Restricts to the version with the given id.
    pub fn id(self, id: impl Into<QValue>) -> Self {
        self.q_and("id", id)
    }

    /// Restricts to versions of the named application.
    pub fn application_name(self, name: impl Into<String>) -> Self {
        self.q_and("project.name", name.into())
    }

    /// Restricts to versions with the given name.
    pub fn version_name(self, name: impl Into<String>) -> Self {
        self.q_and("name", name.into())
    }

    /// Restricts by id or by `<application>:<version>`.
    pub fn name_or_id(self, input: &str) -> Result<Self, Error> {
        self.name_or_id_with_separator(input, DEFAULT_NAME_SEPARATOR)
    }

    /// Restricts by id or by `<application><separator><version>`.
    pub fn name_or_id_with_separator(self, input: &str, separator: &str) -> Result<Self, Error> {
        Ok(match split_name_or_id(input, separator)? {
            NameOrId::Id(id) => match id.parse::<u64>() {
                Ok(numeric) => self.id(numeric),
                Err(_) => self.id(id),
            },
            NameOrId::Names(application, version) => self.application_name(application).version_name(version),
        })
    }

    /// Orders the results.
    pub fn order_by(self, order_by: OrderBy) -> Self {
        self.map(|b| b.order_by(order_by))
    }

    /// Sets the page size.
    pub fn page_size(self, page_size: usize) -> Self {
        self.map(|b| b.page_size(page_size))
    }

    /// Attaches the owning application as on-demand property `application`.
    pub fn on_demand_application(self) -> Self {
        self.on_demand("application", APPLICATION_URI_TEMPLATE)
    }
}

/// Kind of metric history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Variable histories.
    Variable,
    /// Performance indicator histories.
    PerformanceIndicator,
}

impl MetricType {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Variable => "variableHistories",
            Self::PerformanceIndicator => "performanceIndicatorHistories",
        }
    }
}

/// Query for the metric history of one application version.
///
/// The endpoint is not paged.
#[derive(Debug, Clone)]
pub struct MetricHistoriesQuery {
    builder: EntityQueryBuilder,
}

delegate_to_builder!(MetricHistoriesQuery);

impl MetricHistoriesQuery {
    /// Creates a query for the given version and metric type.
    pub fn new(connection: Arc<dyn RestConnection>, version_id: &str, metric_type: MetricType) -> Self {
        let builder = EntityQueryBuilder::new(connection, APPLICATION_VERSIONS_PATH)
            .segment(version_id)
            .segment(metric_type.path_segment())
            .paging(false);
        Self { builder }
    }
}

/// Query for the issues of one application version.
#[derive(Debug, Clone)]
pub struct IssuesQuery {
    builder: EntityQueryBuilder,
}

delegate_to_builder!(IssuesQuery);

impl IssuesQuery {
    /// Creates a query for the given version.
    pub fn new(connection: Arc<dyn RestConnection>, version_id: &str) -> Self {
        let builder = EntityQueryBuilder::new(connection, APPLICATION_VERSIONS_PATH)
            .segment(version_id)
            .segment("issues");
        Self { builder }
    }

    /// Orders the results.
    pub fn order_by(self, order_by: OrderBy) -> Self {
        self.map(|b| b.order_by(order_by))
    }

    /// Groups the results.
    pub fn group_by(self, field: impl Into<String>) -> Self {
        self.map(|b| b.group_by(field))
    }

    /// Embeds related data such as `auditValues`.
    pub fn embed(self, entity: impl Into<String>) -> Self {
        self.map(|b| b.embed(entity))
    }

    /// Sets the page size.
    pub fn page_size(self, page_size: usize) -> Self {
        self.map(|b| b.page_size(page_size))
    }

    /// Applies a filter set by GUID, replacing an earlier one.
    pub fn filter_set(self, guid: impl Into<String>) -> Self {
        self.map(|b| b.set_param("filterset", guid))
    }

    /// Includes hidden issues.
    pub fn show_hidden(self, show: bool) -> Self {
        self.map(|b| b.set_param("showhidden", show.to_string()))
    }

    /// Includes removed issues.
    pub fn show_removed(self, show: bool) -> Self {
        self.map(|b| b.set_param("showremoved", show.to_string()))
    }

    /// Includes suppressed issues.
    pub fn show_suppressed(self, show: bool) -> Self {
        self.map(|b| b.set_param("showsuppressed", show.to_string()))
    }
}

/// Query for Fortify on Demand releases.
///
/// FoD filters with `filters=field:value+...` instead of `q` and pages
/// with `offset`/`limit` over `{"totalCount": N, "items": [...]}`.
#[derive(Debug, Clone)]
pub struct ReleasesQuery {
    builder: EntityQueryBuilder,
}

delegate_to_builder!(ReleasesQuery);

impl ReleasesQuery {
    /// Creates a query over all releases.
    pub fn new(connection: Arc<dyn RestConnection>) -> Self {
        Self {
            builder: EntityQueryBuilder::new(connection, RELEASES_PATH).envelope(Envelope::FOD),
        }
    }

    /// Adds an AND-ed `filters` condition.
    pub fn filter_and(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.map(|b| b.filter_and(field, [value]))
    }

    pub fn release_id(self, id: impl Into<String>) -> Self {
        self.filter_and("releaseId", id)
    }

    pub fn release_name(self, name: impl Into<String>) -> Self {
        self.filter_and("releaseName", name)
    }

    pub fn application_id(self, id: impl Into<String>) -> Self {
        self.filter_and("applicationId", id)
    }

    pub fn application_name(self, name: impl Into<String>) -> Self {
        self.filter_and("applicationName", name)
    }

    /// Restricts to one release of the named application.
    pub fn application_and_release_name(self, application: impl Into<String>, release: impl Into<String>) -> Self {
        self.application_name(application).release_name(release)
    }

    /// Restricts by release id or by `<application>:<release>`.
    pub fn name_or_id(self, input: &str) -> Result<Self, Error> {
        self.name_or_id_with_separator(input, DEFAULT_NAME_SEPARATOR)
    }

    /// Restricts by release id or by `<application><separator><release>`.
    pub fn name_or_id_with_separator(self, input: &str, separator: &str) -> Result<Self, Error> {
        Ok(match split_name_or_id(input, separator)? {
            NameOrId::Id(id) => self.release_id(id),
            NameOrId::Names(application, release) => self.application_and_release_name(application, release),
        })
    }

    /// Restricts to releases with the given star rating.
    pub fn rating(self, rating: u32) -> Self {
        self.filter_and("rating", rating.to_string())
    }

    /// Restricts by SDLC status, such as `Production` or `QA`.
    pub fn sdlc_status_type(self, status: impl Into<String>) -> Self {
        self.filter_and("sdlcStatusType", status)
    }

    /// Restricts to releases that pass or fail their security policy.
    pub fn is_passed(self, passed: bool) -> Self {
        self.filter_and("isPassed", passed.to_string())
    }

    /// Orders the results with `orderBy`/`orderByDirection`.
    pub fn order_by(self, order_by: OrderBy) -> Self {
        let direction = match order_by.direction() {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        let field = order_by.field().to_string();
        self.map(|b| b.set_param("orderBy", field).set_param("orderByDirection", direction))
    }

    /// Sets the page size.
    pub fn page_size(self, page_size: usize) -> Self {
        self.map(|b| b.page_size(page_size))
    }

    /// Attaches the owning application as on-demand property `application`.
    pub fn on_demand_application(self) -> Self {
        self.on_demand("application", RELEASE_APPLICATION_URI_TEMPLATE)
    }
}

/// Query for custom tag definitions.
#[derive(Debug, Clone)]
pub struct CustomTagsQuery {
    builder: EntityQueryBuilder,
}

delegate_to_builder!(CustomTagsQuery);

impl CustomTagsQuery {
    /// Creates a query over all custom tags defined on the server.
    pub fn all(connection: Arc<dyn RestConnection>) -> Self {
        Self {
            builder: EntityQueryBuilder::new(connection, "/api/v1/customTags"),
        }
    }

    /// Creates a query over the custom tags assigned to one version.
    pub fn for_version(connection: Arc<dyn RestConnection>, version_id: &str) -> Self {
        let builder = EntityQueryBuilder::new(connection, APPLICATION_VERSIONS_PATH)
            .segment(version_id)
            .segment("customTags");
        Self { builder }
    }
}
