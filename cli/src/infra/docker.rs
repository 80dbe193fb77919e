//! Docker implementation of the `ContainerRuntime` port, built on bollard.
//!
//! Maps the daemon's HTTP status codes onto the typed `RuntimeError`
//! variants the services match on: 404 becomes `NotFound`, 409 becomes
//! `Conflict`. Everything else is passed through verbatim as `Api`.

use std::collections::HashMap;

use berth_common::ExecResult;
use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::models::{ContainerCreateBody, HostConfig, NetworkCreateRequest, VolumeCreateOptions};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, InspectContainerOptions,
    ListContainersOptionsBuilder, ListNetworksOptions, LogsOptionsBuilder, PushImageOptions,
    RemoveContainerOptionsBuilder, RemoveVolumeOptionsBuilder, StartContainerOptions,
    StopContainerOptions, WaitContainerOptions,
};
use futures::StreamExt;

use crate::application::ports::{
    ContainerDetails, ContainerFilter, ContainerRuntime, ContainerSpec, ContainerSummary,
    ExecSpec, ProgressReporter,
};
use crate::domain::error::RuntimeError;

/// Container runtime adapter over the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the environment's default endpoint.
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Connect(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn map_err(operation: &'static str, target: &str, err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound {
            operation,
            target: target.to_string(),
        },
        BollardError::DockerResponseServerError {
            status_code: 409, ..
        } => RuntimeError::Conflict {
            operation,
            target: target.to_string(),
        },
        other => RuntimeError::Api {
            operation,
            target: target.to_string(),
            message: other.to_string(),
        },
    }
}

/// Push buffered bytes to the sink one complete line at a time.
fn drain_lines(buffer: &mut String, sink: &dyn ProgressReporter) {
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        sink.log(line.trim_end_matches(['\n', '\r']));
    }
}

impl ContainerRuntime for DockerRuntime {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let target = spec.name.clone().unwrap_or_else(|| spec.image.clone());

        let host_config = HostConfig {
            binds: Some(
                spec.binds
                    .iter()
                    .map(|b| format!("{}:{}", b.source, b.target))
                    .collect(),
            ),
            privileged: Some(spec.privileged),
            network_mode: spec.network_mode.clone(),
            extra_hosts: (!spec.extra_hosts.is_empty()).then(|| spec.extra_hosts.clone()),
            ..HostConfig::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image.clone()),
            cmd: (!spec.cmd.is_empty()).then(|| spec.cmd.clone()),
            entrypoint: spec.entrypoint.clone(),
            env: (!spec.env.is_empty()).then(|| spec.env.clone()),
            user: spec.user.clone(),
            hostname: spec.hostname.clone(),
            labels: (!spec.labels.is_empty()).then(|| spec.labels.clone()),
            tty: Some(spec.tty),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..ContainerCreateBody::default()
        };

        let options = spec
            .name
            .as_ref()
            .map(|name| CreateContainerOptionsBuilder::new().name(name).build());

        let response = self
            .docker
            .create_container(options, body)
            .await
            .map_err(|e| map_err("create container", &target, e))?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
            .map_err(|e| map_err("start container", id, e))
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(|e| map_err("stop container", id, e))
    }

    async fn remove_container(
        &self,
        id: &str,
        force: bool,
        remove_volumes: bool,
    ) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(
                id,
                Some(
                    RemoveContainerOptionsBuilder::new()
                        .force(force)
                        .v(remove_volumes)
                        .link(false)
                        .build(),
                ),
            )
            .await
            .map_err(|e| map_err("remove container", id, e))
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_err("inspect container", id, e))?;

        Ok(ContainerDetails {
            id: response.id.unwrap_or_else(|| id.to_string()),
            name: response
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.to_string()),
            running: response
                .state
                .as_ref()
                .and_then(|s| s.running)
                .unwrap_or(false),
            created: response.created,
            labels: response
                .config
                .and_then(|c| c.labels)
                .unwrap_or_default(),
        })
    }

    async fn list_containers(
        &self,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(name) = &filter.name {
            filters.insert("name".to_string(), vec![name.clone()]);
        }
        if let Some(label) = &filter.label {
            filters.insert("label".to_string(), vec![label.clone()]);
        }

        let options = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&filters)
            .build();

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| map_err("list containers", "-", e))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .collect(),
                labels: c.labels.unwrap_or_default(),
            })
            .collect())
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError> {
        let mut stream = self
            .docker
            .wait_container(id, None::<WaitContainerOptions>);

        match stream.next().await {
            Some(Ok(response)) => {
                if let Some(error) = response.error.and_then(|e| e.message) {
                    return Err(RuntimeError::Api {
                        operation: "wait container",
                        target: id.to_string(),
                        message: error,
                    });
                }
                Ok(response.status_code)
            }
            // bollard surfaces a non-zero exit as a typed error; recover the
            // code so the caller sees an exit status, not a transport fault.
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(err)) => Err(map_err("wait container", id, err)),
            None => Err(RuntimeError::Api {
                operation: "wait container",
                target: id.to_string(),
                message: "wait stream ended without a response".to_string(),
            }),
        }
    }

    async fn container_logs(
        &self,
        id: &str,
        follow: bool,
        sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let options = LogsOptionsBuilder::new()
            .follow(follow)
            .stdout(true)
            .stderr(true)
            .build();

        let mut stream = self.docker.logs(id, Some(options));
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| map_err("stream container logs", id, e))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
            drain_lines(&mut buffer, sink);
        }
        if !buffer.is_empty() {
            sink.log(buffer.trim_end_matches(['\n', '\r']));
        }
        Ok(())
    }

    async fn exec(
        &self,
        container: &str,
        spec: &ExecSpec,
        sink: &dyn ProgressReporter,
    ) -> Result<ExecResult, RuntimeError> {
        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    cmd: Some(spec.cmd.clone()),
                    user: spec.user.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| map_err("create exec", container, e))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut buffer = String::new();

        let started = self
            .docker
            .start_exec(&exec.id, None::<StartExecOptions>)
            .await
            .map_err(|e| map_err("start exec", container, e))?;

        if let StartExecResults::Attached { mut output, .. } = started {
            while let Some(chunk) = output.next().await {
                let chunk = chunk.map_err(|e| map_err("stream exec output", container, e))?;
                let is_stderr =
                    matches!(chunk, bollard::container::LogOutput::StdErr { .. });
                let bytes = chunk.into_bytes();
                if is_stderr {
                    stderr.extend_from_slice(&bytes);
                } else {
                    stdout.extend_from_slice(&bytes);
                }
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                drain_lines(&mut buffer, sink);
            }
            if !buffer.is_empty() {
                sink.log(buffer.trim_end_matches(['\n', '\r']));
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| map_err("inspect exec", container, e))?;

        Ok(ExecResult {
            exit_code: inspect.exit_code.unwrap_or(-1),
            stdout,
            stderr,
        })
    }

    async fn create_network(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .create_network(NetworkCreateRequest {
                name: name.to_string(),
                ..NetworkCreateRequest::default()
            })
            .await
            .map(|_| ())
            .map_err(|e| map_err("create network", name, e))
    }

    async fn remove_network(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_network(name)
            .await
            .map_err(|e| map_err("remove network", name, e))
    }

    async fn network_exists(&self, name: &str) -> Result<bool, RuntimeError> {
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions>)
            .await
            .map_err(|e| map_err("list networks", name, e))?;
        Ok(networks
            .iter()
            .any(|n| n.name.as_deref() == Some(name)))
    }

    async fn create_volume(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .create_volume(VolumeCreateOptions {
                name: Some(name.to_string()),
                ..VolumeCreateOptions::default()
            })
            .await
            .map(|_| ())
            .map_err(|e| map_err("create volume", name, e))
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        self.docker
            .remove_volume(
                name,
                Some(RemoveVolumeOptionsBuilder::new().force(force).build()),
            )
            .await
            .map_err(|e| map_err("remove volume", name, e))
    }

    async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(err) => Err(map_err("inspect image", image, err)),
        }
    }

    async fn pull_image(
        &self,
        image: &str,
        sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let options = CreateImageOptionsBuilder::new().from_image(image).build();
        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(info) = stream.next().await {
            let info = info.map_err(|e| map_err("pull image", image, e))?;
            if let Some(status) = info.status {
                match info.progress {
                    Some(progress) => sink.log(&format!("{status} {progress}")),
                    None => sink.log(&status),
                }
            }
        }
        Ok(())
    }

    async fn push_image(
        &self,
        image: &str,
        sink: &dyn ProgressReporter,
    ) -> Result<(), RuntimeError> {
        let mut stream = self
            .docker
            .push_image(image, None::<PushImageOptions>, None);

        while let Some(info) = stream.next().await {
            let info = info.map_err(|e| map_err("push image", image, e))?;
            if let Some(error) = info.error {
                return Err(RuntimeError::Api {
                    operation: "push image",
                    target: image.to_string(),
                    message: error,
                });
            }
            if let Some(status) = info.status {
                match info.progress {
                    Some(progress) => sink.log(&format!("{status} {progress}")),
                    None => sink.log(&status),
                }
            }
        }
        Ok(())
    }
}
