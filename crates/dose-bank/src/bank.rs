// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Item Bank Container
// ─────────────────────────────────────────────────────────────────────
//! Keyed access to the item inventory plus the load-time validator for
//! custom banks and the `number,trait,reverse,alpha,beta1..beta6` table
//! format.

use dose_types::{DoseError, DoseResult, TraitDomain};

use crate::items::{Item, ITEMS, ITEMS_PER_TRAIT};

/// Immutable item inventory with a per-trait index.
#[derive(Debug, Clone)]
pub struct ItemBank {
    items: Vec<Item>,
    /// Item numbers per trait, in bank order.
    by_trait: [Vec<u8>; TraitDomain::COUNT],
}

impl ItemBank {
    /// The built-in Mini-IPIP6 inventory.
    pub fn builtin() -> Self {
        // Static data is covered by tests; skip the runtime validator.
        Self::index(ITEMS.to_vec())
    }

    /// Build a bank from arbitrary items, validating each row.
    ///
    /// Per-item rules only: positive finite α, finite β, unique numbers.
    /// Use [`ItemBank::parse_table`] for the full-inventory partition
    /// check.
    pub fn new(items: Vec<Item>) -> DoseResult<Self> {
        if items.is_empty() {
            return Err(DoseError::InvalidItem("empty item bank".into()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for item in &items {
            validate_item(item)?;
            if !seen.insert(item.number) {
                return Err(DoseError::InvalidItem(format!(
                    "duplicate item number {}",
                    item.number
                )));
            }
        }
        Ok(Self::index(items))
    }

    fn index(items: Vec<Item>) -> Self {
        let mut by_trait: [Vec<u8>; TraitDomain::COUNT] = Default::default();
        for item in &items {
            by_trait[item.domain.index()].push(item.number);
        }
        Self { items, by_trait }
    }

    /// Parse the table format: one item per line,
    /// `number,trait,reverse,alpha,beta1,beta2,beta3,beta4,beta5,beta6`.
    ///
    /// Blank lines, `#` comments, and a leading `number,...` header are
    /// skipped. The parsed inventory must partition 24 items into
    /// four-item trait subsets.
    pub fn parse_table(table: &str) -> DoseResult<Self> {
        let mut items = Vec::new();
        for (lineno, line) in table.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if lineno == 0 && line.to_ascii_lowercase().starts_with("number") {
                continue;
            }
            items.push(parse_row(line).map_err(|e| {
                DoseError::InvalidItem(format!("line {}: {e}", lineno + 1))
            })?);
        }
        let bank = Self::new(items)?;
        bank.validate_partition()?;
        Ok(bank)
    }

    /// Full-inventory check: 24 items, exactly four per trait.
    pub fn validate_partition(&self) -> DoseResult<()> {
        if self.items.len() != TraitDomain::COUNT * ITEMS_PER_TRAIT {
            return Err(DoseError::InvalidItem(format!(
                "expected {} items, got {}",
                TraitDomain::COUNT * ITEMS_PER_TRAIT,
                self.items.len()
            )));
        }
        for domain in TraitDomain::ALL {
            let n = self.by_trait[domain.index()].len();
            if n != ITEMS_PER_TRAIT {
                return Err(DoseError::InvalidItem(format!(
                    "trait {} has {} items, expected {}",
                    domain.code(),
                    n,
                    ITEMS_PER_TRAIT
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Look up an item by number.
    pub fn item(&self, number: u8) -> Option<&Item> {
        self.items.iter().find(|i| i.number == number)
    }

    /// Item numbers belonging to one trait, in bank order.
    pub fn trait_items(&self, domain: TraitDomain) -> &[u8] {
        &self.by_trait[domain.index()]
    }

    /// Highest-discrimination item for a trait, skipping `exclude`.
    ///
    /// Cold-start heuristic: with a flat-at-zero posterior the most
    /// discriminating item is the conventional opener.
    pub fn highest_discrimination_item(
        &self,
        domain: TraitDomain,
        exclude: &[u8],
    ) -> Option<u8> {
        self.trait_items(domain)
            .iter()
            .filter(|n| !exclude.contains(n))
            .filter_map(|n| self.item(*n))
            .max_by(|a, b| a.alpha.partial_cmp(&b.alpha).unwrap_or(std::cmp::Ordering::Equal))
            .map(|i| i.number)
    }
}

fn validate_item(item: &Item) -> DoseResult<()> {
    if !item.alpha.is_finite() || item.alpha <= 0.0 {
        return Err(DoseError::InvalidItem(format!(
            "item {}: alpha must be positive and finite, got {}",
            item.number, item.alpha
        )));
    }
    if item.beta.iter().any(|b| !b.is_finite()) {
        return Err(DoseError::InvalidItem(format!(
            "item {}: non-finite threshold",
            item.number
        )));
    }
    Ok(())
}

fn parse_row(line: &str) -> Result<Item, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 10 {
        return Err(format!("expected 10 fields, got {}", fields.len()));
    }
    let number: u8 = fields[0]
        .parse()
        .map_err(|_| format!("bad item number {:?}", fields[0]))?;
    let domain = TraitDomain::parse(fields[1])
        .ok_or_else(|| format!("unknown trait {:?}", fields[1]))?;
    let reverse = match fields[2] {
        "true" | "1" => true,
        "false" | "0" => false,
        other => return Err(format!("bad reverse flag {:?}", other)),
    };
    let alpha: f64 = fields[3]
        .parse()
        .map_err(|_| format!("bad alpha {:?}", fields[3]))?;
    let mut beta = [0.0; 6];
    for (slot, field) in beta.iter_mut().zip(&fields[4..10]) {
        *slot = field
            .parse()
            .map_err(|_| format!("bad threshold {field:?}"))?;
    }
    Ok(Item {
        number,
        domain,
        reverse,
        alpha,
        beta,
    })
}
