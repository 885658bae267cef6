use super::{CollectorConfig, CollectorError, LineBuffer, should_forward};
use crate::domain::{ContainerMeta, LogRecord};
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::models::ContainerInspectResponse;
use bollard::query_parameters::{InspectContainerOptions, ListContainersOptions, LogsOptions};
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct DockerCollector {
    docker: Docker,
    config: CollectorConfig,
}

impl DockerCollector {
    pub async fn new(config: CollectorConfig) -> Result<Self, CollectorError> {
        let docker = match &config.docker_host {
            Some(socket_path) => {
                Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_socket_defaults()?,
        };
        Ok(Self { docker, config })
    }

    pub async fn can_connect(&self) -> bool {
        self.docker.ping().await.is_ok()
    }

    /// Running containers that pass the label filter, with their metadata.
    pub async fn discover(&self) -> Result<Vec<ContainerMeta>, CollectorError> {
        self.discover_excluding(&HashSet::new()).await
    }

    /// Like [`discover`](Self::discover), skipping the ids in `known`.
    async fn discover_excluding(
        &self,
        known: &HashSet<String>,
    ) -> Result<Vec<ContainerMeta>, CollectorError> {
        let options = ListContainersOptions {
            all: false, // Only running containers
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| CollectorError::DiscoveryFailed(e.to_string()))?;

        let mut found = Vec::new();
        for container in containers {
            let labels = container.labels.unwrap_or_default();
            if !should_forward(&labels, self.config.filter_label.as_deref()) {
                continue;
            }
            let Some(id) = container.id else {
                continue;
            };
            if known.contains(&id) {
                continue;
            }

            // The container may have exited since it was listed.
            match self
                .docker
                .inspect_container(&id, None::<InspectContainerOptions>)
                .await
            {
                Ok(inspected) => found.push(meta_from_inspect(inspected)),
                Err(e) => tracing::warn!("Skipping container {}: {}", id, e),
            }
        }

        Ok(found)
    }

    /// Follows every matching container until `cancel` fires.
    ///
    /// Containers are rediscovered every `discovery_interval`, so ones
    /// started later are picked up too. Only the first discovery error is
    /// returned; later ones are logged and retried on the next tick. `tx` is
    /// dropped when this returns, which closes the adapter's input.
    pub async fn run(
        self,
        tx: mpsc::Sender<LogRecord>,
        cancel: CancellationToken,
    ) -> Result<(), CollectorError> {
        let mut followers: HashMap<String, JoinHandle<()>> = HashMap::new();
        let containers = self.discover().await?;
        self.follow_new(containers, &mut followers, &tx, &cancel);

        let mut ticker = tokio::time::interval(self.config.discovery_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            followers.retain(|_, handle| !handle.is_finished());
            let known: HashSet<String> = followers.keys().cloned().collect();
            match self.discover_excluding(&known).await {
                Ok(containers) => self.follow_new(containers, &mut followers, &tx, &cancel),
                Err(e) => tracing::warn!("Container rediscovery failed: {}", e),
            }
        }

        for (_, handle) in followers {
            if let Err(e) = handle.await {
                tracing::error!("Log follower task failed: {}", e);
            }
        }
        Ok(())
    }

    fn follow_new(
        &self,
        containers: Vec<ContainerMeta>,
        followers: &mut HashMap<String, JoinHandle<()>>,
        tx: &mpsc::Sender<LogRecord>,
        cancel: &CancellationToken,
    ) {
        for container in containers {
            let Some(id) = container.id.clone() else {
                continue;
            };
            if followers.contains_key(&id) {
                continue;
            }

            let handle = tokio::spawn(follow_logs(
                self.docker.clone(),
                container,
                self.logs_options(),
                tx.clone(),
                cancel.clone(),
            ));
            followers.insert(id, handle);
        }
    }

    fn logs_options(&self) -> LogsOptions {
        LogsOptions {
            follow: true,
            stdout: true,
            stderr: true,
            timestamps: false,
            tail: self.config.tail.clone(),
            ..Default::default()
        }
    }
}

fn meta_from_inspect(inspected: ContainerInspectResponse) -> ContainerMeta {
    let (image, hostname) = inspected
        .config
        .map(|config| (config.image, config.hostname))
        .unwrap_or_default();

    ContainerMeta {
        id: inspected.id,
        name: inspected.name,
        image,
        hostname,
    }
}

async fn follow_logs(
    docker: Docker,
    container: ContainerMeta,
    options: LogsOptions,
    tx: mpsc::Sender<LogRecord>,
    cancel: CancellationToken,
) {
    let Some(id) = container.id.clone() else {
        return;
    };
    let name = container.name.clone().unwrap_or_default();
    tracing::info!("Starting to tail logs for container: {} ({})", name, container.short_id());

    let mut stream = docker.logs(&id, Some(options));
    // stdout and stderr frames interleave, so each keeps its own partial line.
    let mut stdout = LineBuffer::new();
    let mut stderr = LineBuffer::new();

    loop {
        let chunk = tokio::select! {
            () = cancel.cancelled() => break,
            chunk = stream.next() => chunk,
        };

        let records = match chunk {
            Some(Ok(output)) => {
                let buffer = if matches!(output, LogOutput::StdErr { .. }) {
                    &mut stderr
                } else {
                    &mut stdout
                };
                buffer.push(&output.into_bytes(), &container)
            }
            Some(Err(e)) => {
                tracing::error!("Error reading logs from container {}: {}", name, e);
                break;
            }
            None => break,
        };

        if !send_all(&tx, records).await {
            tracing::debug!("Log channel closed, stopping {}", name);
            return;
        }
    }

    let tails = [stdout.finish(&container), stderr.finish(&container)];
    if !send_all(&tx, tails.into_iter().flatten().collect()).await {
        tracing::debug!("Log channel closed, dropping final line of {}", name);
    }

    tracing::info!("Stopped tailing logs for container: {}", name);
}

/// Sends `records` in order; `false` once the channel is closed.
async fn send_all(tx: &mpsc::Sender<LogRecord>, records: Vec<LogRecord>) -> bool {
    for record in records {
        // Awaiting capacity is the backpressure from a slow transport.
        if tx.send(record).await.is_err() {
            return false;
        }
    }
    true
}
