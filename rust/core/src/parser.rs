// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP tessellation seam.
//!
//! Turning B-rep STEP geometry into triangles needs a CAD kernel, so the
//! pipeline only talks to a [`GeometryParser`]. [`CommandParser`] is the
//! production implementation: it pipes the STEP bytes into an external
//! mesher process and reads back occt-import-js style JSON:
//!
//! ```json
//! {"success": true, "meshes": [
//!   {"attributes": {"position": {"array": [0, 0, 0, 1, 0, 0, 0, 1, 0]}},
//!    "index": {"array": [0, 1, 2]}}
//! ]}
//! ```

use crate::mesh::MeshBuffer;
use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};

/// Result of tessellating one STEP file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub success: bool,
    pub meshes: Vec<MeshBuffer>,
}

impl ParseOutcome {
    pub fn succeeded(meshes: Vec<MeshBuffer>) -> Self {
        Self {
            success: true,
            meshes,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// External STEP → mesh capability
pub trait GeometryParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<ParseOutcome>;
}

impl<F> GeometryParser for F
where
    F: Fn(&[u8]) -> anyhow::Result<ParseOutcome> + Send + Sync,
{
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<ParseOutcome> {
        self(bytes)
    }
}

#[derive(Debug, Deserialize)]
struct MesherOutput {
    success: bool,
    #[serde(default)]
    meshes: Vec<MesherMesh>,
}

#[derive(Debug, Deserialize)]
struct MesherMesh {
    attributes: MesherAttributes,
    index: MesherArray<u32>,
}

#[derive(Debug, Deserialize)]
struct MesherAttributes {
    position: MesherArray<f32>,
}

#[derive(Debug, Deserialize)]
struct MesherArray<T> {
    array: Vec<T>,
}

/// Decode mesher JSON output into a [`ParseOutcome`].
pub fn decode_mesher_output(json: &[u8]) -> anyhow::Result<ParseOutcome> {
    let output: MesherOutput =
        serde_json::from_slice(json).context("mesher produced invalid JSON")?;

    Ok(ParseOutcome {
        success: output.success,
        meshes: output
            .meshes
            .into_iter()
            .map(|m| MeshBuffer::new(m.attributes.position.array, m.index.array))
            .collect(),
    })
}

/// Runs an external mesher command per STEP file
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    program: Option<String>,
    args: Vec<String>,
}

impl CommandParser {
    /// Build from a command line such as `node occt-mesher.js --linear 0.1`.
    /// Arguments are split on whitespace.
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        Self {
            program: parts.next(),
            args: parts.collect(),
        }
    }

    /// Parser with no mesher configured; every parse fails.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.program.is_some()
    }
}

impl GeometryParser for CommandParser {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<ParseOutcome> {
        let program = self
            .program
            .as_deref()
            .ok_or_else(|| anyhow!("no STEP mesher command configured"))?;

        tracing::debug!(program, args = ?self.args, size = bytes.len(), "Running STEP mesher");

        let mut child = Command::new(program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start mesher '{}'", program))?;

        // Feed stdin from a separate thread so a chatty mesher cannot
        // deadlock on a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("mesher stdin unavailable"))?;
        let input = bytes.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .context("failed to wait for mesher")?;

        match writer.join() {
            Ok(Ok(())) => {}
            // The mesher may legitimately stop reading early once it fails;
            // its exit status below carries the real error.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(anyhow::Error::new(e).context("failed to send STEP data to mesher"))
            }
            Err(_) => bail!("mesher stdin writer panicked"),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("mesher exited with {}: {}", output.status, stderr.trim());
        }

        decode_mesher_output(&output.stdout)
    }
}
