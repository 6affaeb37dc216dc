use thiserror::Error;

#[derive(Debug, Error)]
pub enum MolfileError {
    #[error("molblock ends before the counts line")]
    MissingCountsLine,
    #[error("bad counts line: {0:?}")]
    BadCountsLine(String),
    #[error("atom block ends after {got} of {want} atoms")]
    TruncatedAtomBlock { want: usize, got: usize },
    #[error("bad atom line: {0:?}")]
    BadAtomLine(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub symbol: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
}

impl Molecule {
    /// XYZ text for viewers that take plain coordinate lists: atom count,
    /// comment line, then one `Symbol x y z` row per atom.
    pub fn to_xyz(&self) -> String {
        let mut out = format!("{}\n", self.atoms.len());
        out.push_str("molblock converted to XYZ format\n");
        for atom in &self.atoms {
            out.push_str(&format!(
                "{} {:.6} {:.6} {:.6}\n",
                atom.symbol, atom.x, atom.y, atom.z
            ));
        }
        out
    }
}

/// Reads the atom block of a V2000 molblock: three free-text header lines,
/// the counts line (`aaabbb...` with the atom count in the first three
/// columns), then `natoms` lines of `x y z symbol ...`. Bond and property
/// blocks are not needed for coordinate export and are ignored.
pub fn parse_molblock(text: &str) -> Result<Molecule, MolfileError> {
    let mut lines = text.lines();
    for _ in 0..3 {
        lines.next().ok_or(MolfileError::MissingCountsLine)?;
    }
    let counts = lines.next().ok_or(MolfileError::MissingCountsLine)?;
    let natoms = counts
        .get(..3)
        .and_then(|field| field.trim().parse::<usize>().ok())
        .ok_or_else(|| MolfileError::BadCountsLine(counts.to_string()))?;

    let mut atoms = Vec::with_capacity(natoms);
    for _ in 0..natoms {
        let line = lines.next().ok_or(MolfileError::TruncatedAtomBlock {
            want: natoms,
            got: atoms.len(),
        })?;
        atoms.push(parse_atom_line(line)?);
    }
    Ok(Molecule { atoms })
}

fn parse_atom_line(line: &str) -> Result<Atom, MolfileError> {
    let bad = || MolfileError::BadAtomLine(line.to_string());
    let mut fields = line.split_whitespace();
    let x = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let y = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let z = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let symbol = fields.next().ok_or_else(bad)?;
    if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(bad());
    }
    Ok(Atom {
        symbol: symbol.to_string(),
        x,
        y,
        z,
    })
}
