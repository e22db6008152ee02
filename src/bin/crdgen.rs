// SPDX-License-Identifier: MIT

//! Writes the operator's CRD manifests to `deploy/crds/`.
//!
//! The manifests are derived from the types in [`powerdns_operator::crd`];
//! rerun `cargo run --bin crdgen` whenever those types change so the YAML in
//! the repository never drifts from the code.

use kube::CustomResourceExt;
use powerdns_operator::crd::{ClusterRRset, ClusterZone, RRset, Zone};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

const GENERATED_NOTE: &str = "\
# SPDX-License-Identifier: MIT
#
# Generated from src/crd.rs by `cargo run --bin crdgen`.
# Edit the Rust types, not this file.
#
";

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from("deploy/crds");
    fs::create_dir_all(&out_dir)?;

    let manifests = [
        ("zones.crd.yaml", serde_yaml::to_string(&Zone::crd())?),
        (
            "clusterzones.crd.yaml",
            serde_yaml::to_string(&ClusterZone::crd())?,
        ),
        ("rrsets.crd.yaml", serde_yaml::to_string(&RRset::crd())?),
        (
            "clusterrrsets.crd.yaml",
            serde_yaml::to_string(&ClusterRRset::crd())?,
        ),
    ];

    for (filename, yaml) in manifests {
        let path = out_dir.join(filename);
        fs::write(&path, format!("{GENERATED_NOTE}{yaml}"))?;
        println!("wrote {}", path.display());
    }

    println!("apply with: kubectl apply -f {}", out_dir.display());
    Ok(())
}
