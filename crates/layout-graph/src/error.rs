use derive_more::{Display, Error};

/// The closed error taxonomy of §7. Every precondition failure in the
/// domain layer is one of these; gateway transport failures surface
/// separately as `error_stack::Report<graph_gateway::GatewayError>` and are
/// always retriable, whereas everything here is not (§7 propagation policy).
#[derive(Debug, Display, Error)]
pub enum DomainError {
    // --- not-added ---------------------------------------------------
    #[display("component has not been added to the graph")]
    ComponentNotAdded,
    #[display("property has not been added to the graph")]
    PropertyNotAdded,
    #[display("property type has not been added to the graph")]
    PropertyTypeNotAdded,
    #[display("component type has not been added to the graph")]
    ComponentTypeNotAdded,
    #[display("component version has not been added to the graph")]
    ComponentVersionNotAdded,
    #[display("flag has not been added to the graph")]
    FlagNotAdded,
    #[display("flag type has not been added to the graph")]
    FlagTypeNotAdded,
    #[display("flag severity has not been added to the graph")]
    FlagSeverityNotAdded,
    #[display("user has not been added to the graph")]
    UserNotAdded,
    #[display("user group has not been added to the graph")]
    UserGroupNotAdded,
    #[display("permission has not been added to the graph")]
    PermissionNotAdded,

    // --- already-added -------------------------------------------------
    #[display("vertex has already been added to the graph")]
    VertexAlreadyAdded,
    #[display("edge has already been added to the graph")]
    EdgeAlreadyAdded,

    // --- schema ----------------------------------------------------------
    #[display("property has the wrong number of values for its type")]
    PropertyWrongNValues,
    #[display("a property value does not match its type's allowed regex")]
    PropertyNotMatchRegex,
    #[display("a property type must allow at least one component type")]
    PropertyTypeZeroAllowedTypes,
    #[display("a user group must grant at least one permission")]
    UserGroupZeroPermission,

    // --- temporal / relational -------------------------------------------
    #[display("the new property has the same values as the currently active one")]
    PropertyIsSame,
    #[display("set_property would start before an existing, later property")]
    SetPropertyBeforeExistingProperty,
    #[display("forcing set_property with a finite end_time would overlap an existing property")]
    PropertiesOverlapping,
    #[display("the components are already connected at this instant")]
    ComponentsAlreadyConnected,
    #[display("the components are already disconnected at this instant")]
    ComponentsAlreadyDisconnected,
    #[display("connect would start before an existing, later connection")]
    ConnectBeforeExistingConnection,
    #[display("forcing connect with a finite end_time would overlap an existing connection")]
    ConnectionsOverlapping,
    #[display("a component cannot be connected to itself")]
    ConnectToSelf,
    #[display("this component is already a subcomponent of the other")]
    AlreadySubcomponent,
    #[display("this component is already a super-component of the other")]
    IsSubcomponentOfOther,
    #[display("a component cannot be a subcomponent of itself")]
    SubcomponentToSelf,
}

/// Everything a public operation in this crate can fail with: either a
/// closed domain-taxonomy failure (not retriable, §7) or a gateway failure
/// that was normalized to one of the three families in
/// [`graph_gateway::GatewayError`] (always retriable).
#[derive(Debug, Display)]
pub enum Error {
    #[display("{_0}")]
    Domain(DomainError),
    #[display("{_0}")]
    Gateway(graph_gateway::GatewayError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(error) => Some(error),
            Self::Gateway(error) => Some(error),
        }
    }
}

impl From<DomainError> for Error {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

impl From<graph_gateway::GatewayError> for Error {
    fn from(error: graph_gateway::GatewayError) -> Self {
        Self::Gateway(error)
    }
}

/// The `Result` alias used throughout the public API of this crate.
pub type Result<T> = error_stack::Result<T, Error>;

/// Lifts a `graph_gateway::Result` into this crate's `Result`, preserving the
/// gateway `Report`'s attachments and backtrace while changing its context
/// from [`graph_gateway::GatewayError`] to [`Error`].
pub(crate) fn from_gateway<T>(
    result: error_stack::Result<T, graph_gateway::GatewayError>,
) -> Result<T> {
    result.map_err(|report| {
        let context = report.current_context().clone();
        report.change_context(Error::Gateway(context))
    })
}

pub(crate) fn domain_err<T>(error: DomainError) -> Result<T> {
    Err(error_stack::Report::new(Error::Domain(error)))
}
