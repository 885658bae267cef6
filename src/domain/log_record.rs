/// Identity of the container a record came from.
///
/// Every field is optional: a producer that cannot inspect the container
/// still emits records, and the wire message fills the gaps with `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMeta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub hostname: Option<String>,
}

impl ContainerMeta {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            image: Some(image.into()),
            hostname: Some(hostname.into()),
        }
    }

    /// Short form of the container id, as `docker ps` prints it.
    pub fn short_id(&self) -> &str {
        self.id
            .as_deref()
            .map_or("", |id| id.get(..12).unwrap_or(id))
    }
}

/// A single unit of log output handed to the adapter by its producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub data: String,
    pub container: ContainerMeta,
}

impl LogRecord {
    pub fn new(data: impl Into<String>, container: ContainerMeta) -> Self {
        Self {
            data: data.into(),
            container,
        }
    }

    /// Record without any container metadata.
    pub fn bare(data: impl Into<String>) -> Self {
        Self::new(data, ContainerMeta::default())
    }
}
