mod dataset;
mod hierarchy;
mod molfile;
mod spectrum;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dataset::Dataset;
use hierarchy::{build_hierarchy, to_chart_input, SunburstInput};
use molfile::parse_molblock;
use spectrum::base_peak;

#[derive(Deserialize)]
struct CompoundQuery {
    row: Option<usize>,
}

#[derive(Serialize)]
struct CompoundResponse {
    row: usize,
    count: usize,
    name: String,
    smiles: Option<String>,
    xyz: Option<String>,
    spectrum: Vec<[f64; 2]>,
    peak_count: usize,
    base_peak_mz: Option<f64>,
    sunburst: SunburstInput,
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Molecular Data Viewer</title>
    <link rel="preconnect" href="https://fonts.googleapis.com" />
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin />
    <link href="https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&display=swap" rel="stylesheet" />
    <script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/3dmol@2.1.0/build/3Dmol-min.js"></script>
    <script src="https://unpkg.com/smiles-drawer@2.0.3/dist/smiles-drawer.min.js"></script>
    <style>
      html, body { margin: 0; padding: 0; min-height: 100%; background: #0b0c10; color: #e6e6e6; font-family: "Space Grotesk", "Segoe UI", sans-serif; }
      #panel { margin: 16px; padding: 14px; background: rgba(10,12,16,0.9); border: 1px solid #2a2f36; border-radius: 10px; box-shadow: 0 10px 28px rgba(0,0,0,0.35); }
      .brand { font-size: 18px; font-weight: 600; letter-spacing: 0.02em; }
      .blurb { font-size: 13px; color: #9aa3ad; margin-top: 8px; max-width: 760px; line-height: 1.5; }
      .row { display: flex; align-items: center; gap: 8px; margin-top: 12px; }
      .row label { font-size: 12px; color: #a7b0ba; }
      input[type="number"] { background: #0f141b; color: #e6e6e6; border: 1px solid #2a2f36; border-radius: 6px; padding: 4px 8px; font-size: 13px; width: 90px; }
      button { background: #1a2736; color: #e6e6e6; border: 1px solid #3c6a9e; border-radius: 6px; padding: 6px 12px; font-size: 13px; cursor: pointer; }
      #status { margin-top: 10px; font-size: 12px; color: #b2bac4; }
      #panes { display: flex; flex-wrap: wrap; gap: 16px; margin: 0 16px 16px; }
      .pane { background: #0f1218; border: 1px solid #2a2f36; border-radius: 10px; padding: 12px; }
      .pane-title { font-size: 12px; text-transform: uppercase; letter-spacing: 0.12em; color: #9aa3ad; margin-bottom: 8px; }
      .pane-empty { font-size: 12px; color: #7f8895; padding: 24px 8px; }
      #viewer3d { width: 350px; height: 350px; position: relative; }
      #structure2d { background: #0f141b; border-radius: 6px; }
      #spectrum { width: 560px; height: 420px; }
      #sunburst { width: 520px; height: 520px; }
    </style>
  </head>
  <body>
    <div id="panel">
      <div class="brand">Molecular Data Viewer</div>
      <div class="blurb">
        Pick a row to inspect one compound from the loaded dataset: its
        molecular structure (3D stick model and 2D depiction), its mass
        spectrum, and a sunburst of its hierarchical classification.
      </div>
      <div class="row">
        <label for="row">Row</label>
        <input id="row" type="number" min="1" value="1" step="1" />
        <button id="go">Show</button>
      </div>
      <div id="status">Ready.</div>
    </div>
    <div id="panes">
      <div class="pane">
        <div class="pane-title" id="structureTitle">Structure</div>
        <div id="viewer3d"></div>
        <canvas id="structure2d" width="350" height="260"></canvas>
        <div id="structureEmpty" class="pane-empty" style="display: none;">No structure data for this row.</div>
      </div>
      <div class="pane">
        <div class="pane-title">Mass spectrum</div>
        <div id="spectrum"></div>
        <div id="spectrumEmpty" class="pane-empty" style="display: none;">No spectrum for this row.</div>
      </div>
      <div class="pane">
        <div class="pane-title">Classification</div>
        <div id="sunburst"></div>
        <div id="sunburstEmpty" class="pane-empty" style="display: none;">No classification for this row.</div>
      </div>
    </div>
    <script>
      const statusEl = document.getElementById("status");
      const rowInput = document.getElementById("row");
      const structureTitle = document.getElementById("structureTitle");
      const viewer3dEl = document.getElementById("viewer3d");
      const canvas2d = document.getElementById("structure2d");
      const structureEmpty = document.getElementById("structureEmpty");
      const spectrumEl = document.getElementById("spectrum");
      const spectrumEmpty = document.getElementById("spectrumEmpty");
      const sunburstEl = document.getElementById("sunburst");
      const sunburstEmpty = document.getElementById("sunburstEmpty");

      const drawer = new SmilesDrawer.Drawer({ width: 350, height: 260 });
      let viewer3d = null;

      const plotBase = {
        paper_bgcolor: "#0f1218",
        plot_bgcolor: "#0f141b",
        font: { family: "Space Grotesk, Segoe UI, sans-serif", size: 12, color: "#e6e6e6" },
      };

      function setVisible(el, visible) {
        el.style.display = visible ? "" : "none";
      }

      function renderStructure(data) {
        const any = Boolean(data.xyz || data.smiles);
        setVisible(structureEmpty, !any);
        setVisible(viewer3dEl, Boolean(data.xyz));
        setVisible(canvas2d, Boolean(data.smiles));
        if (data.xyz) {
          if (!viewer3d) {
            viewer3d = $3Dmol.createViewer(viewer3dEl, { backgroundColor: "#0f141b" });
          }
          viewer3d.clear();
          viewer3d.addModel(data.xyz, "xyz");
          viewer3d.setStyle({}, { stick: {} });
          viewer3d.zoomTo();
          viewer3d.render();
        }
        if (data.smiles) {
          SmilesDrawer.parse(
            data.smiles,
            (tree) => drawer.draw(tree, "structure2d", "dark"),
            () => setVisible(canvas2d, false)
          );
        }
      }

      function renderSpectrum(data) {
        const hasPeaks = data.spectrum.length > 0;
        setVisible(spectrumEl, hasPeaks);
        setVisible(spectrumEmpty, !hasPeaks);
        if (!hasPeaks) {
          return;
        }
        const xs = [];
        const ys = [];
        for (const [mz, intensity] of data.spectrum) {
          xs.push(mz, mz, null);
          ys.push(0, intensity, null);
        }
        Plotly.react(spectrumEl, [
          { x: xs, y: ys, mode: "lines", line: { color: "#4c8dff", width: 2 }, connectgaps: false, hoverinfo: "x+y" },
        ], {
          ...plotBase,
          title: { text: `Mass Spectrum for ${data.name}`, font: { size: 15 } },
          xaxis: { title: "m/z", gridcolor: "#1f2630", zerolinecolor: "#2a2f36" },
          yaxis: { title: "Intensity", gridcolor: "#1f2630", zerolinecolor: "#2a2f36" },
          showlegend: false,
          margin: { l: 55, r: 20, t: 45, b: 45 },
        }, { displayModeBar: false });
      }

      function renderSunburst(data) {
        const hasNodes = data.sunburst.labels.length > 0;
        setVisible(sunburstEl, hasNodes);
        setVisible(sunburstEmpty, !hasNodes);
        if (!hasNodes) {
          return;
        }
        Plotly.react(sunburstEl, [
          {
            type: "sunburst",
            labels: data.sunburst.labels,
            parents: data.sunburst.parents,
            values: data.sunburst.weights,
          },
        ], {
          ...plotBase,
          title: { text: `Concept Hierarchy for ${data.name}`, font: { size: 15 } },
          margin: { l: 10, r: 10, t: 45, b: 10 },
        }, { displayModeBar: false });
      }

      async function fetchCompound() {
        statusEl.textContent = "Loading...";
        const row = Number(rowInput.value) || 1;
        const res = await fetch(`/compound?row=${row}`);
        if (!res.ok) {
          statusEl.textContent = "Error: " + res.status + " " + (await res.text());
          return;
        }
        const data = await res.json();
        rowInput.max = data.count;
        if (Number(rowInput.value) !== data.row) {
          rowInput.value = data.row;
        }
        structureTitle.textContent = `Structure of ${data.name}`;
        renderStructure(data);
        renderSpectrum(data);
        renderSunburst(data);
        const basePeak = data.base_peak_mz === null ? "" : ` | base peak m/z ${data.base_peak_mz}`;
        statusEl.textContent = `${data.name} | row ${data.row}/${data.count} | ${data.peak_count} peaks${basePeak}`;
      }

      document.getElementById("go").addEventListener("click", () => {
        fetchCompound().catch((err) => { statusEl.textContent = err.toString(); });
      });
      rowInput.addEventListener("change", () => {
        fetchCompound().catch((err) => { statusEl.textContent = err.toString(); });
      });

      fetchCompound().catch((err) => { statusEl.textContent = err.toString(); });
    </script>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn compound(
    State(data): State<Arc<Dataset>>,
    Query(q): Query<CompoundQuery>,
) -> impl IntoResponse {
    match compound_response(&data, q.row.unwrap_or(1)) {
        Some(out) => Json(out).into_response(),
        None => (StatusCode::NOT_FOUND, "dataset is empty").into_response(),
    }
}

/// Builds the full per-row payload. Each pane's data degrades
/// independently: a malformed structure or an empty series turns into
/// `None`/empty, never an error for the whole row.
fn compound_response(data: &Dataset, requested_row: usize) -> Option<CompoundResponse> {
    let row = data.clamp_row(requested_row);
    let compound = data.get(row)?;

    let xyz = if compound.mol_file.is_empty() {
        None
    } else {
        match parse_molblock(&compound.mol_file) {
            Ok(mol) if !mol.atoms.is_empty() => Some(mol.to_xyz()),
            Ok(_) => None,
            Err(e) => {
                log::warn!("row {row} ({}): skipping structure: {e}", compound.name);
                None
            }
        }
    };
    let smiles = if compound.smiles.is_empty() {
        None
    } else {
        Some(compound.smiles.clone())
    };

    let spectrum: Vec<[f64; 2]> = compound
        .spectrum
        .iter()
        .map(|p| [p.mz, p.intensity])
        .collect();
    let base_peak_mz = base_peak(&compound.spectrum).map(|p| p.mz);

    let sunburst = to_chart_input(&build_hierarchy(&compound.classification));

    Some(CompoundResponse {
        row,
        count: data.len(),
        name: compound.name.clone(),
        smiles,
        xyz,
        peak_count: spectrum.len(),
        spectrum,
        base_peak_mz,
        sunburst,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let source =
        std::env::var("MOLVIEW_DATA").unwrap_or_else(|_| "data/compounds.json".to_string());
    let addr: SocketAddr = std::env::var("MOLVIEW_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .context("parse MOLVIEW_ADDR")?;

    let data = dataset::load(&source)
        .await
        .with_context(|| format!("load dataset from {source}"))?;
    log::info!("loaded {} compounds from {source}", data.len());
    if data.is_empty() {
        log::warn!("dataset is empty; the viewer will have nothing to show");
    }

    let app = Router::new()
        .route("/", get(index))
        .route("/compound", get(compound))
        .with_state(Arc::new(data));

    log::info!("serving on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"[
        {
            "name": "Ethanol",
            "SMILES": "CCO",
            "molFile": "ethanol\n  molview\n\n  3  2  0  0  0  0  0  0  0  0999 V2000\n   -0.8880    0.1650    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0\n    0.4220    0.5430    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0\n    1.3110   -0.4630    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0\n  1  2  1  0\n  2  3  1  0\nM  END\n",
            "parsed_spectrum": [[31.0, 100.0], [45.0, 51.5], [46.0, 21.7]],
            "classification": [
                {"name": "kingdom", "value": "Organic compounds"},
                {"name": "superclass", "value": "Organic oxygen compounds"},
                {"name": "alternative parent 1", "value": "Hydrocarbon derivatives"}
            ]
        },
        {
            "name": "Broken",
            "SMILES": "",
            "molFile": "no counts line here",
            "parsed_spectrum": [],
            "classification": []
        }
    ]"#;

    fn dataset() -> Dataset {
        Dataset::from_json(DATA).unwrap()
    }

    #[test]
    fn test_full_row() {
        let out = compound_response(&dataset(), 1).unwrap();
        assert_eq!(out.row, 1);
        assert_eq!(out.count, 2);
        assert_eq!(out.name, "Ethanol");
        assert_eq!(out.smiles.as_deref(), Some("CCO"));
        let xyz = out.xyz.unwrap();
        assert!(xyz.starts_with("3\n"));
        assert!(xyz.contains("O 1.311000"));
        assert_eq!(out.peak_count, 3);
        assert_eq!(out.base_peak_mz, Some(31.0));
        assert_eq!(out.sunburst.labels.len(), 3);
        assert_eq!(
            out.sunburst.parents,
            ["", "Organic compounds", "Organic oxygen compounds"]
        );
    }

    #[test]
    fn test_panes_degrade_independently() {
        let out = compound_response(&dataset(), 2).unwrap();
        assert_eq!(out.name, "Broken");
        assert!(out.smiles.is_none());
        assert!(out.xyz.is_none());
        assert!(out.spectrum.is_empty());
        assert!(out.base_peak_mz.is_none());
        assert!(out.sunburst.labels.is_empty());
    }

    #[test]
    fn test_row_is_clamped() {
        let out = compound_response(&dataset(), 99).unwrap();
        assert_eq!(out.row, 2);
        let out = compound_response(&dataset(), 0).unwrap();
        assert_eq!(out.row, 1);
    }

    #[test]
    fn test_empty_dataset_has_no_response() {
        let empty = Dataset::from_json("[]").unwrap();
        assert!(compound_response(&empty, 1).is_none());
    }
}
