use super::error::{MolIoError, SdfParseErrorKind};
use crate::core::models::atom::{Atom, Element};
use crate::core::models::molecule::{Bond, BondOrder, Conformer, Molecule};
use nalgebra::Point3;
use std::io::{BufRead, Lines};
use std::str::FromStr;

const RECORD_SEPARATOR: &str = "$$$$";

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}

fn parse_error(line: usize, kind: SdfParseErrorKind) -> MolIoError {
    MolIoError::Parse { line, kind }
}

/// Lazily parses the records of a V2000 SD file, one single-conformer
/// [`Molecule`] per record.
///
/// A malformed record yields an error and the iterator moves on to the next
/// record; an I/O error ends the iteration.
pub struct SdfRecords<R> {
    lines: Lines<R>,
    line_no: usize,
    exhausted: bool,
}

impl<R: BufRead> SdfRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            exhausted: false,
        }
    }

    fn next_block(&mut self) -> Result<Vec<(usize, String)>, MolIoError> {
        let mut block = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    if line.trim_end() == RECORD_SEPARATOR {
                        return Ok(block);
                    }
                    block.push((self.line_no, line));
                }
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Err(e.into());
                }
                None => {
                    self.exhausted = true;
                    return Ok(block);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for SdfRecords<R> {
    type Item = Result<Molecule, MolIoError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let block = match self.next_block() {
                Ok(block) => block,
                Err(e) => return Some(Err(e)),
            };
            if block.iter().all(|(_, line)| line.trim().is_empty()) {
                continue;
            }
            return Some(parse_record(&block));
        }
        None
    }
}

fn parse_record(block: &[(usize, String)]) -> Result<Molecule, MolIoError> {
    let last_line = block.last().map_or(0, |(ln, _)| *ln);
    if block.len() < 4 {
        return Err(parse_error(
            last_line,
            SdfParseErrorKind::TruncatedRecord("header"),
        ));
    }

    let title = block[0].1.trim().to_string();
    let (counts_line_no, counts_line) = (&block[3].0, &block[3].1);
    if counts_line.contains("V3000") {
        return Err(parse_error(
            *counts_line_no,
            SdfParseErrorKind::V3000Unsupported,
        ));
    }
    let (atom_count, bond_count) = parse_counts(counts_line, *counts_line_no)?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let property_start = bond_start + bond_count;
    if block.len() < bond_start {
        return Err(parse_error(
            last_line,
            SdfParseErrorKind::TruncatedRecord("atom"),
        ));
    }
    if block.len() < property_start {
        return Err(parse_error(
            last_line,
            SdfParseErrorKind::TruncatedRecord("bond"),
        ));
    }

    let (mut atoms, coords) = parse_atoms(&block[atom_start..bond_start])?;
    let bonds = parse_bonds(&block[bond_start..property_start], atom_count)?;
    apply_charge_properties(&block[property_start..], &mut atoms)?;

    Ok(Molecule::new(title, atoms, bonds).with_conformers(vec![Conformer::new(coords)]))
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), MolIoError> {
    let parse = |start: usize, field: &'static str, token: Option<&str>| {
        let fixed = slice_and_trim(line, start, start + 3);
        fixed
            .parse::<usize>()
            .or_else(|_| token.unwrap_or("").parse::<usize>())
            .map_err(|_| {
                parse_error(
                    line_no,
                    SdfParseErrorKind::InvalidCount {
                        field,
                        value: fixed.to_string(),
                    },
                )
            })
    };
    let mut tokens = line.split_whitespace();
    let atoms = parse(0, "atom count", tokens.next())?;
    let bonds = parse(3, "bond count", tokens.next())?;
    Ok((atoms, bonds))
}

fn charge_from_code(code: &str) -> i8 {
    match code.parse::<u8>().unwrap_or(0) {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn parse_atoms(lines: &[(usize, String)]) -> Result<(Vec<Atom>, Vec<Point3<f64>>), MolIoError> {
    let mut atoms = Vec::with_capacity(lines.len());
    let mut coords = Vec::with_capacity(lines.len());
    for (line_no, line) in lines {
        let mut xyz = [0.0; 3];
        for (i, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            let value = slice_and_trim(line, i * 10, i * 10 + 10);
            xyz[i] = value.parse::<f64>().map_err(|_| {
                parse_error(
                    *line_no,
                    SdfParseErrorKind::InvalidCoordinate {
                        axis,
                        value: value.to_string(),
                    },
                )
            })?;
        }
        let symbol = slice_and_trim(line, 31, 34);
        let element = Element::from_str(symbol).map_err(|_| {
            parse_error(
                *line_no,
                SdfParseErrorKind::InvalidElement(symbol.to_string()),
            )
        })?;
        let charge = charge_from_code(slice_and_trim(line, 36, 39));

        atoms.push(Atom::with_charge(element, charge));
        coords.push(Point3::new(xyz[0], xyz[1], xyz[2]));
    }
    Ok((atoms, coords))
}

fn parse_bonds(lines: &[(usize, String)], atom_count: usize) -> Result<Vec<Bond>, MolIoError> {
    let mut bonds = Vec::with_capacity(lines.len());
    for (line_no, line) in lines {
        let mut fields = [0usize; 3];
        for (i, field) in fields.iter_mut().enumerate() {
            let value = slice_and_trim(line, i * 3, i * 3 + 3);
            *field = value.parse().map_err(|_| {
                parse_error(
                    *line_no,
                    SdfParseErrorKind::InvalidBondField {
                        value: value.to_string(),
                    },
                )
            })?;
        }
        let [a1, a2, order_code] = fields;
        for index in [a1, a2] {
            if index == 0 || index > atom_count {
                return Err(parse_error(
                    *line_no,
                    SdfParseErrorKind::BondOutOfRange { index, atom_count },
                ));
            }
        }
        let order_code = u8::try_from(order_code).unwrap_or(u8::MAX);
        let order = BondOrder::from_code(order_code).ok_or_else(|| {
            parse_error(
                *line_no,
                SdfParseErrorKind::UnsupportedBondOrder(order_code),
            )
        })?;
        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }
    Ok(bonds)
}

/// Applies `M  CHG` lines. Their presence supersedes every atom-block charge.
fn apply_charge_properties(
    lines: &[(usize, String)],
    atoms: &mut [Atom],
) -> Result<(), MolIoError> {
    let mut reset = false;
    for (line_no, line) in lines {
        if line.starts_with("M  END") {
            break;
        }
        if !line.starts_with("M  CHG") {
            continue;
        }
        if !reset {
            atoms.iter_mut().for_each(|a| a.formal_charge = 0);
            reset = true;
        }

        let invalid = || parse_error(*line_no, SdfParseErrorKind::InvalidChargeLine);
        let tokens: Vec<&str> = line.split_whitespace().skip(2).collect();
        let (count, pairs) = tokens.split_first().ok_or_else(invalid)?;
        let count: usize = count.parse().map_err(|_| invalid())?;
        if count.checked_mul(2).is_none_or(|n| pairs.len() < n) {
            return Err(invalid());
        }
        for pair in pairs.chunks_exact(2).take(count) {
            let index: usize = pair[0].parse().map_err(|_| invalid())?;
            let charge: i8 = pair[1].parse().map_err(|_| invalid())?;
            let atom = index
                .checked_sub(1)
                .and_then(|i| atoms.get_mut(i))
                .ok_or_else(invalid)?;
            atom.formal_charge = charge;
        }
    }
    Ok(())
}

/// Renders a minimal V2000 record; used to build fixtures in tests.
#[cfg(test)]
pub(crate) fn write_record(
    title: &str,
    atoms: &[(&str, [f64; 3], i8)],
    bonds: &[(usize, usize, u8)],
) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push_str("\n  coloverlap\n\n");
    out.push_str(&format!(
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000\n",
        atoms.len(),
        bonds.len()
    ));
    for (symbol, [x, y, z], _) in atoms {
        out.push_str(&format!(
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0\n",
            x, y, z, symbol
        ));
    }
    for (a, b, order) in bonds {
        out.push_str(&format!("{:>3}{:>3}{:>3}  0\n", a, b, order));
    }
    for (i, (_, _, charge)) in atoms.iter().enumerate() {
        if *charge != 0 {
            out.push_str(&format!("M  CHG  1 {:>3} {:>3}\n", i + 1, charge));
        }
    }
    out.push_str("M  END\n$$$$\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(text: &str) -> Vec<Result<Molecule, MolIoError>> {
        SdfRecords::new(Cursor::new(text.to_string())).collect()
    }

    fn ethanol() -> String {
        write_record(
            "ethanol",
            &[
                ("C", [0.0, 0.0, 0.0], 0),
                ("C", [1.52, 0.0, 0.0], 0),
                ("O", [2.0, 1.35, 0.0], 0),
            ],
            &[(1, 2, 1), (2, 3, 1)],
        )
    }

    #[test]
    fn reads_atoms_bonds_and_coordinates() {
        let records = read_all(&ethanol());
        assert_eq!(records.len(), 1);
        let mol = records[0].as_ref().unwrap();
        assert_eq!(mol.title, "ethanol");
        assert_eq!(mol.num_atoms(), 3);
        assert_eq!(mol.bonds().len(), 2);
        assert_eq!(mol.atoms()[2].element, Element::O);
        assert_eq!(mol.num_conformers(), 1);
        assert_eq!(mol.conformers()[0].coords[2], Point3::new(2.0, 1.35, 0.0));
        assert_eq!(mol.bonds()[1], Bond::new(1, 2, BondOrder::Single));
    }

    #[test]
    fn reads_multiple_records_in_order() {
        let text = format!(
            "{}{}",
            ethanol(),
            write_record("water", &[("O", [0.0, 0.0, 0.0], 0)], &[])
        );
        let titles: Vec<String> = read_all(&text)
            .into_iter()
            .map(|r| r.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["ethanol", "water"]);
    }

    #[test]
    fn charge_properties_override_atom_block_charges() {
        let text = write_record(
            "acetate",
            &[
                ("C", [0.0, 0.0, 0.0], 0),
                ("O", [1.2, 0.0, 0.0], 0),
                ("O", [-0.6, 1.0, 0.0], -1),
            ],
            &[(1, 2, 2), (1, 3, 1)],
        );
        let mol = read_all(&text).remove(0).unwrap();
        let charges: Vec<i8> = mol.atoms().iter().map(|a| a.formal_charge).collect();
        assert_eq!(charges, vec![0, 0, -1]);
        assert_eq!(mol.bonds()[0].order, BondOrder::Double);
    }

    #[test]
    fn oversized_charge_count_is_a_parse_error() {
        let text = write_record("ion", &[("N", [0.0, 0.0, 0.0], 1)], &[]).replace(
            "M  CHG  1   1   1",
            "M  CHG 9223372036854775808   1   1",
        );
        assert!(text.contains("9223372036854775808"));
        let records = read_all(&text);
        assert!(matches!(
            records[0],
            Err(MolIoError::Parse {
                kind: SdfParseErrorKind::InvalidChargeLine,
                ..
            })
        ));
    }

    #[test]
    fn charge_count_larger_than_listed_pairs_is_a_parse_error() {
        let text = write_record("ion", &[("N", [0.0, 0.0, 0.0], 1)], &[])
            .replace("M  CHG  1   1   1", "M  CHG  2   1   1");
        assert!(matches!(
            read_all(&text)[0],
            Err(MolIoError::Parse {
                kind: SdfParseErrorKind::InvalidChargeLine,
                ..
            })
        ));
    }

    #[test]
    fn atom_block_charge_codes_are_decoded() {
        assert_eq!(charge_from_code("3"), 1);
        assert_eq!(charge_from_code("5"), -1);
        assert_eq!(charge_from_code("4"), 0);
        assert_eq!(charge_from_code(""), 0);
    }

    #[test]
    fn trailing_blank_lines_do_not_produce_records() {
        let text = format!("{}\n\n", ethanol());
        assert_eq!(read_all(&text).len(), 1);
    }

    #[test]
    fn last_record_without_separator_is_still_read() {
        let text = ethanol().replace("$$$$\n", "");
        let records = read_all(&text);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_ok());
    }

    #[test]
    fn v3000_records_are_rejected() {
        let text = ethanol().replace("V2000", "V3000");
        let err = read_all(&text).remove(0).unwrap_err();
        assert!(matches!(
            err,
            MolIoError::Parse {
                line: 4,
                kind: SdfParseErrorKind::V3000Unsupported
            }
        ));
    }

    #[test]
    fn truncated_atom_block_is_reported() {
        let text = "t\n\n\n  3  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0\n$$$$\n";
        let err = read_all(text).remove(0).unwrap_err();
        assert!(matches!(
            err,
            MolIoError::Parse {
                kind: SdfParseErrorKind::TruncatedRecord("atom"),
                ..
            }
        ));
    }

    #[test]
    fn bond_to_missing_atom_is_reported_with_line_number() {
        let text = write_record("bad", &[("C", [0.0, 0.0, 0.0], 0)], &[(1, 2, 1)]);
        let err = read_all(&text).remove(0).unwrap_err();
        match err {
            MolIoError::Parse { line, kind } => {
                assert_eq!(line, 6);
                assert_eq!(
                    kind,
                    SdfParseErrorKind::BondOutOfRange {
                        index: 2,
                        atom_count: 1
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_record_does_not_stop_following_records() {
        let bad = ethanol().replace("    1.5200", "    x.5200");
        let text = format!("{}{}", bad, ethanol());
        let records = read_all(&text);
        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[0],
            Err(MolIoError::Parse {
                kind: SdfParseErrorKind::InvalidCoordinate { axis: 'x', .. },
                ..
            })
        ));
        assert!(records[1].is_ok());
    }
}
