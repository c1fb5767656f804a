//! TNTP file loaders.
//!
//! # Format
//!
//! Both input files open with a metadata header of `<TAG> value` lines
//! terminated by `<END OF METADATA>`.  Comment lines begin with `~`; blank
//! lines are skipped throughout.
//!
//! **Link file** body: one arc per line, ten whitespace-separated fields
//! (an optional trailing `;` is tolerated):
//!
//! ```text
//! tail  head  capacity  length  free_flow_time  alpha  beta  speed  toll  type
//! ```
//!
//! **Trip file** body: `Origin <r>` lines switch the current origin;
//! subsequent `dest : demand ;` entries fill that origin's row.
//!
//! Node and zone numbers are 1-based in the files and 0-based in memory.
//!
//! # Two-phase loading
//!
//! The trip file may override `DISTANCE FACTOR` and `TOLL FACTOR`, and those
//! factors enter each arc's fixed cost.  Parsing therefore yields raw
//! [`LinkData`]/[`TripData`] first; [`assemble`] resolves the factors and
//! builds the [`Network`] once both files are in.
//!
//! All entry points take any `Read` source, with `Path` wrappers on top, so
//! tests can feed `std::io::Cursor` strings.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tap_core::NodeId;

use crate::demand::DemandMatrix;
use crate::error::{NetworkError, NetworkResult};
use crate::network::{ArcSpec, Network, NetworkBuilder};

// ── Parsed file contents ──────────────────────────────────────────────────────

/// Raw contents of a link file, before CSR assembly.
#[derive(Debug)]
pub struct LinkData {
    pub num_zones: usize,
    pub num_nodes: usize,
    /// 0-based; nodes below this index are centroids.
    pub first_through_node: usize,
    pub distance_factor: f64,
    pub toll_factor: f64,
    pub arcs: Vec<ArcSpec>,
}

/// Raw contents of a trip file.
#[derive(Debug)]
pub struct TripData {
    pub num_zones: usize,
    /// Factor overrides; `None` keeps the link file's value.
    pub distance_factor: Option<f64>,
    pub toll_factor: Option<f64>,
    pub demand: DemandMatrix,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a network and demand matrix from a TNTP link file and trip file.
pub fn load(link_path: &Path, trip_path: &Path) -> NetworkResult<(Network, DemandMatrix)> {
    let links = parse_links_reader(std::fs::File::open(link_path)?)?;
    let trips = parse_trips_reader(std::fs::File::open(trip_path)?)?;
    assemble(links, trips)
}

/// Combine parsed link and trip data into a finished network.
///
/// Verifies the zone counts agree, resolves the cost factors (trip file
/// overrides win), and builds the CSR network.
pub fn assemble(links: LinkData, trips: TripData) -> NetworkResult<(Network, DemandMatrix)> {
    if trips.num_zones != links.num_zones {
        return Err(NetworkError::ZoneCountMismatch {
            links: links.num_zones,
            trips: trips.num_zones,
        });
    }

    let distance_factor = trips.distance_factor.unwrap_or(links.distance_factor);
    let toll_factor = trips.toll_factor.unwrap_or(links.toll_factor);

    let mut builder = NetworkBuilder::new(
        links.num_nodes,
        links.num_zones,
        links.first_through_node,
    )
    .with_arc_capacity(links.arcs.len());
    for arc in links.arcs {
        builder.add_arc(arc);
    }
    let network = builder.build(distance_factor, toll_factor)?;

    Ok((network, trips.demand))
}

/// Parse a TNTP link file from any `Read` source.
pub fn parse_links_reader<R: Read>(reader: R) -> NetworkResult<LinkData> {
    let mut lines = BufReader::new(reader).lines();
    let mut lineno = 0usize;

    // ── Metadata header ───────────────────────────────────────────────────
    let mut num_zones: Option<usize> = None;
    let mut num_nodes: Option<usize> = None;
    let mut num_links: Option<usize> = None;
    let mut first_thru: Option<usize> = None;
    let mut distance_factor = 0.0;
    let mut toll_factor = 0.0;

    for line in lines.by_ref() {
        let line = line?;
        lineno += 1;
        let Some((tag, value)) = metadata_line(&line) else {
            continue;
        };
        if tag == "END OF METADATA" {
            break;
        }
        match tag.as_str() {
            "NUMBER OF ZONES" => num_zones = Some(parse_value(value, lineno)?),
            "NUMBER OF NODES" => num_nodes = Some(parse_value(value, lineno)?),
            "NUMBER OF LINKS" => num_links = Some(parse_value(value, lineno)?),
            "FIRST THRU NODE" => {
                let one_based: usize = parse_value(value, lineno)?;
                first_thru = Some(one_based.saturating_sub(1));
            }
            "DISTANCE FACTOR" => distance_factor = parse_value(value, lineno)?,
            "TOLL FACTOR" => toll_factor = parse_value(value, lineno)?,
            other => log::warn!("link file line {lineno}: unknown metadata tag <{other}>"),
        }
    }

    let num_zones = num_zones.ok_or(NetworkError::MissingMetadata("NUMBER OF ZONES"))?;
    let num_nodes = num_nodes.ok_or(NetworkError::MissingMetadata("NUMBER OF NODES"))?;
    let first_through_node =
        first_thru.ok_or(NetworkError::MissingMetadata("FIRST THRU NODE"))?;

    // ── Link body ─────────────────────────────────────────────────────────
    let mut arcs = Vec::with_capacity(num_links.unwrap_or(0));

    for line in lines {
        let line = line?;
        lineno += 1;
        let body = line.trim().trim_end_matches(';').trim_end();
        if body.is_empty() || body.starts_with('~') {
            continue;
        }

        let fields: Vec<&str> = body.split_whitespace().collect();
        if fields.len() < 10 {
            return Err(NetworkError::Parse {
                line: lineno,
                msg: format!("expected 10 link fields, found {}", fields.len()),
            });
        }

        let tail = parse_node(fields[0], num_nodes, lineno)?;
        let head = parse_node(fields[1], num_nodes, lineno)?;
        arcs.push(ArcSpec {
            tail,
            head,
            capacity: parse_value(fields[2], lineno)?,
            length: parse_value(fields[3], lineno)?,
            free_flow_time: parse_value(fields[4], lineno)?,
            alpha: parse_value(fields[5], lineno)?,
            beta: parse_value(fields[6], lineno)?,
            speed_limit: parse_value(fields[7], lineno)?,
            toll: parse_value(fields[8], lineno)?,
            link_type: parse_value(fields[9], lineno)?,
        });
    }

    if let Some(declared) = num_links {
        if declared != arcs.len() {
            log::warn!(
                "link file declares {declared} links but contains {}",
                arcs.len()
            );
        }
    }

    Ok(LinkData {
        num_zones,
        num_nodes,
        first_through_node,
        distance_factor,
        toll_factor,
        arcs,
    })
}

/// Parse a TNTP trip file from any `Read` source.
pub fn parse_trips_reader<R: Read>(reader: R) -> NetworkResult<TripData> {
    let mut lines = BufReader::new(reader).lines();
    let mut lineno = 0usize;

    // ── Metadata header ───────────────────────────────────────────────────
    let mut num_zones: Option<usize> = None;
    let mut total_od_flow: Option<f64> = None;
    let mut distance_factor: Option<f64> = None;
    let mut toll_factor: Option<f64> = None;

    for line in lines.by_ref() {
        let line = line?;
        lineno += 1;
        let Some((tag, value)) = metadata_line(&line) else {
            continue;
        };
        if tag == "END OF METADATA" {
            break;
        }
        match tag.as_str() {
            "NUMBER OF ZONES" => num_zones = Some(parse_value(value, lineno)?),
            "TOTAL OD FLOW" => total_od_flow = Some(parse_value(value, lineno)?),
            "DISTANCE FACTOR" => distance_factor = Some(parse_value(value, lineno)?),
            "TOLL FACTOR" => toll_factor = Some(parse_value(value, lineno)?),
            other => log::warn!("trip file line {lineno}: unknown metadata tag <{other}>"),
        }
    }

    let num_zones = num_zones.ok_or(NetworkError::MissingMetadata("NUMBER OF ZONES"))?;
    let mut demand = DemandMatrix::new(num_zones);

    // ── Trip body ─────────────────────────────────────────────────────────
    let mut current_origin: Option<usize> = None;

    for line in lines {
        let line = line?;
        lineno += 1;
        let body = line.trim();
        if body.is_empty() || body.starts_with('~') {
            continue;
        }

        if let Some(rest) = body.strip_prefix("Origin") {
            let origin = parse_node(rest.trim(), num_zones, lineno)?;
            current_origin = Some(origin.index());
            continue;
        }

        let origin = current_origin.ok_or_else(|| NetworkError::Parse {
            line: lineno,
            msg: "demand entry before any Origin line".into(),
        })?;

        // One line may carry several `dest : demand ;` entries.
        for entry in body.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((dest_str, demand_str)) = entry.split_once(':') else {
                return Err(NetworkError::Parse {
                    line: lineno,
                    msg: format!("expected `dest : demand`, found {entry:?}"),
                });
            };
            let dest = parse_node(dest_str.trim(), num_zones, lineno)?;
            let trips: f64 = parse_value(demand_str.trim(), lineno)?;
            demand.set(origin, dest.index(), trips)?;
        }
    }

    if let Some(declared) = total_od_flow {
        let actual = demand.total();
        if (actual - declared).abs() > 1e-6 * declared.abs().max(1.0) {
            log::warn!("trip file declares {declared} total trips but contains {actual}");
        }
    }

    Ok(TripData {
        num_zones,
        distance_factor,
        toll_factor,
        demand,
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Split a `<TAG> value` metadata line into `(tag, value)`.
///
/// Returns `None` for blank lines, comments, and anything that is not a
/// tag line.
fn metadata_line(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('~') {
        return None;
    }
    let rest = trimmed.strip_prefix('<')?;
    let (tag, value) = rest.split_once('>')?;
    Some((tag.trim().to_string(), value.trim()))
}

/// Parse a 1-based node or zone number and convert to a 0-based [`NodeId`].
fn parse_node(token: &str, max: usize, line: usize) -> NetworkResult<NodeId> {
    let raw: i64 = token.parse().map_err(|_| NetworkError::Parse {
        line,
        msg: format!("invalid node number {token:?}"),
    })?;
    if raw < 1 || raw as usize > max {
        return Err(NetworkError::NodeOutOfRange {
            node: raw,
            max,
            line,
        });
    }
    Ok(NodeId(raw as u32 - 1))
}

/// Parse a numeric field, attaching the line number on failure.
fn parse_value<T: std::str::FromStr>(token: &str, line: usize) -> NetworkResult<T> {
    token.parse().map_err(|_| NetworkError::Parse {
        line,
        msg: format!("invalid numeric value {token:?}"),
    })
}
