// src/services/costing.rs
// Valorización de inventario por costo unitario promedio ponderado (CUP).

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::{
    common::error::AppError,
    models::inventory::{TipoAjuste, TipoMovimiento},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostingError {
    #[error("La cantidad debe ser mayor que cero.")]
    NonPositiveQuantity,

    #[error("El costo unitario no puede ser negativo.")]
    NegativeCost,

    #[error("El stock contado no puede ser negativo.")]
    NegativeCount,

    #[error("Stock insuficiente: disponible {disponible}, requerido {requerido}")]
    InsufficientStock { disponible: Decimal, requerido: Decimal },

    #[error("El conteo físico coincide con el stock del sistema.")]
    NoDifference,
}

impl CostingError {
    /// Traduce el error al de la API, nombrando el producto afectado.
    pub fn for_product(self, producto: &str) -> AppError {
        match self {
            CostingError::InsufficientStock { disponible, requerido } => {
                AppError::InsufficientStock {
                    producto: producto.to_string(),
                    disponible,
                    requerido,
                }
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

pub fn round_cup(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

/// Stock y CUP de un producto en un momento dado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPosition {
    pub stock: Decimal,
    pub cup: Decimal,
}

/// Resultado de aplicar un movimiento: lo que se registra en el kardex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub tipo: TipoMovimiento,
    pub cantidad: Decimal,
    pub costo_unitario: Decimal,
    pub after: StockPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResult {
    pub tipo: TipoAjuste,
    pub diferencia: Decimal,
    pub change: StockChange,
}

impl StockPosition {
    pub fn new(stock: Decimal, cup: Decimal) -> Self {
        Self { stock, cup }
    }

    pub fn entry(&self, cantidad: Decimal, costo: Decimal) -> Result<StockChange, CostingError> {
        if cantidad <= Decimal::ZERO {
            return Err(CostingError::NonPositiveQuantity);
        }
        if costo < Decimal::ZERO {
            return Err(CostingError::NegativeCost);
        }

        let stock = self.stock + cantidad;
        let cup = if self.stock <= Decimal::ZERO {
            costo
        } else {
            (self.stock * self.cup + cantidad * costo) / stock
        };

        Ok(StockChange {
            tipo: TipoMovimiento::Entrada,
            cantidad,
            costo_unitario: costo,
            after: StockPosition { stock, cup: round_cup(cup) },
        })
    }

    // La salida se valoriza al CUP vigente y no lo modifica
    pub fn exit(&self, cantidad: Decimal) -> Result<StockChange, CostingError> {
        if cantidad <= Decimal::ZERO {
            return Err(CostingError::NonPositiveQuantity);
        }
        if self.stock < cantidad {
            return Err(CostingError::InsufficientStock {
                disponible: self.stock,
                requerido: cantidad,
            });
        }

        Ok(StockChange {
            tipo: TipoMovimiento::Salida,
            cantidad,
            costo_unitario: self.cup,
            after: StockPosition {
                stock: self.stock - cantidad,
                cup: self.cup,
            },
        })
    }

    /// Conteo físico: el stock pasa a ser lo contado y el CUP se conserva.
    pub fn physical_count(&self, contado: Decimal) -> Result<CountResult, CostingError> {
        if contado < Decimal::ZERO {
            return Err(CostingError::NegativeCount);
        }
        let diferencia = contado - self.stock;
        if diferencia.is_zero() {
            return Err(CostingError::NoDifference);
        }

        let (tipo, tipo_movimiento) = if diferencia > Decimal::ZERO {
            (TipoAjuste::Positivo, TipoMovimiento::Entrada)
        } else {
            (TipoAjuste::Negativo, TipoMovimiento::Salida)
        };

        Ok(CountResult {
            tipo,
            diferencia,
            change: StockChange {
                tipo: tipo_movimiento,
                cantidad: diferencia.abs(),
                costo_unitario: self.cup,
                after: StockPosition {
                    stock: contado,
                    cup: self.cup,
                },
            },
        })
    }
}

/// Costo unitario del producto terminado: costo de materiales / unidades producidas.
pub fn production_unit_cost(
    costo_materiales: Decimal,
    cantidad_producida: Decimal,
) -> Result<Decimal, CostingError> {
    if cantidad_producida <= Decimal::ZERO {
        return Err(CostingError::NonPositiveQuantity);
    }
    Ok(round_cup(costo_materiales / cantidad_producida))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn entry_recomputes_weighted_average() {
        let pos = StockPosition::new(d("100"), d("2.00"));
        let change = pos.entry(d("50"), d("3.50")).unwrap();

        assert_eq!(change.tipo, TipoMovimiento::Entrada);
        assert_eq!(change.after.stock, d("150"));
        // (100·2 + 50·3.5) / 150 = 2.5
        assert_eq!(change.after.cup, d("2.5"));
    }

    #[test]
    fn entry_on_empty_stock_takes_incoming_cost() {
        let pos = StockPosition::new(Decimal::ZERO, d("9.99"));
        let change = pos.entry(d("10"), d("1.20")).unwrap();
        assert_eq!(change.after.cup, d("1.20"));
        assert_eq!(change.after.stock, d("10"));
    }

    #[test]
    fn entry_rounds_cup_to_six_decimals() {
        let pos = StockPosition::new(d("3"), d("1"));
        let change = pos.entry(d("3"), d("2")).unwrap();
        assert_eq!(change.after.cup, d("1.5"));

        let change = StockPosition::new(d("1"), d("1")).entry(d("2"), d("0")).unwrap();
        assert_eq!(change.after.cup, d("0.333333"));
    }

    #[test]
    fn entry_rejects_invalid_input() {
        let pos = StockPosition::new(d("1"), d("1"));
        assert_eq!(pos.entry(Decimal::ZERO, d("1")), Err(CostingError::NonPositiveQuantity));
        assert_eq!(pos.entry(d("1"), d("-1")), Err(CostingError::NegativeCost));
    }

    #[test]
    fn exit_keeps_cup_and_values_at_current_cost() {
        let pos = StockPosition::new(d("20"), d("4.25"));
        let change = pos.exit(d("5")).unwrap();

        assert_eq!(change.tipo, TipoMovimiento::Salida);
        assert_eq!(change.costo_unitario, d("4.25"));
        assert_eq!(change.after, StockPosition::new(d("15"), d("4.25")));
    }

    #[test]
    fn exit_requires_enough_stock() {
        let pos = StockPosition::new(d("2"), d("1"));
        assert_eq!(
            pos.exit(d("3")),
            Err(CostingError::InsufficientStock {
                disponible: d("2"),
                requerido: d("3"),
            })
        );
        // Se puede vaciar por completo
        assert_eq!(pos.exit(d("2")).unwrap().after.stock, Decimal::ZERO);
    }

    #[test]
    fn physical_count_sets_counted_stock() {
        let pos = StockPosition::new(d("100"), d("1.5"));

        let up = pos.physical_count(d("104")).unwrap();
        assert_eq!(up.tipo, TipoAjuste::Positivo);
        assert_eq!(up.diferencia, d("4"));
        assert_eq!(up.change.cantidad, d("4"));
        assert_eq!(up.change.after, StockPosition::new(d("104"), d("1.5")));

        let down = pos.physical_count(d("90")).unwrap();
        assert_eq!(down.tipo, TipoAjuste::Negativo);
        assert_eq!(down.change.tipo, TipoMovimiento::Salida);
        assert_eq!(down.change.cantidad, d("10"));
    }

    #[test]
    fn physical_count_needs_a_difference() {
        let pos = StockPosition::new(d("7"), d("1"));
        assert_eq!(pos.physical_count(d("7")), Err(CostingError::NoDifference));
    }

    #[test]
    fn physical_count_accepts_zero_but_not_negative() {
        let pos = StockPosition::new(d("7"), d("1"));

        let vacio = pos.physical_count(Decimal::ZERO).unwrap();
        assert_eq!(vacio.tipo, TipoAjuste::Negativo);
        assert_eq!(vacio.change.after.stock, Decimal::ZERO);

        let err = pos.physical_count(d("-1")).unwrap_err();
        assert_eq!(err, CostingError::NegativeCount);
        assert_eq!(err.to_string(), "El stock contado no puede ser negativo.");
    }

    #[test]
    fn production_cost_divides_materials_by_output() {
        assert_eq!(production_unit_cost(d("450"), d("300")).unwrap(), d("1.5"));
        assert_eq!(
            production_unit_cost(d("10"), Decimal::ZERO),
            Err(CostingError::NonPositiveQuantity)
        );
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let err = CostingError::InsufficientStock {
            disponible: d("1"),
            requerido: d("2"),
        }
        .for_product("Lámina kraft");

        assert!(matches!(err, AppError::InsufficientStock { ref producto, .. } if producto == "Lámina kraft"));
    }
}
