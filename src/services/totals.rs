// src/services/totals.rs
//
// O motor de cálculo das faturas. Funções puras, sem IO:
// tudo que entra no banco em subtotal/tax_amount/total passa por aqui.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::invoice::{DiscountType, LineItem, LineItemPayload},
};

// Resultado agregado de uma fatura
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// Arredondamento "meio para cima" (half-up), sempre em 2 casas.
// Regra única para os quatro agregados.
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Valor de uma linha: `quantity * rate * (1 + tax/100)`.
///
/// Sem arredondamento aqui; só os agregados da fatura são arredondados.
/// Imposto fora de [0, 100] é aceito nesta função (a camada de payload
/// é quem rejeita; ver `build_items`).
pub fn calculate_item_amount(
    quantity: Decimal,
    rate: Decimal,
    tax: Decimal,
) -> Result<Decimal, AppError> {
    if quantity < Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "A quantidade do item não pode ser negativa.".to_string(),
        ));
    }
    if rate < Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "O valor unitário do item não pode ser negativo.".to_string(),
        ));
    }

    let base = quantity * rate;
    Ok(base + base * tax / HUNDRED)
}

/// Agregados da fatura a partir dos itens e do desconto.
///
/// subtotal       = Σ quantity*rate (antes do imposto)
/// tax_amount     = Σ quantity*rate*tax/100
/// discount_amount= desconto fixo, ou percentual sobre o subtotal
/// total          = subtotal + tax_amount - discount_amount
///
/// Cada um dos quatro é arredondado de forma independente para 2 casas.
/// Total negativo é permitido: preferimos expor o erro de digitação do
/// que escondê-lo com um clamp em zero.
pub fn calculate_invoice_totals(
    items: &[LineItem],
    discount: Decimal,
    discount_type: DiscountType,
) -> Result<InvoiceTotals, AppError> {
    let mut subtotal = Decimal::ZERO;
    let mut tax_amount = Decimal::ZERO;

    for item in items {
        if item.quantity < Decimal::ZERO || item.rate < Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "Itens com quantidade ou valor negativo não são permitidos.".to_string(),
            ));
        }
        let base = item.quantity * item.rate;
        subtotal += base;
        tax_amount += base * item.tax / HUNDRED;
    }

    let discount_amount = match discount_type {
        DiscountType::Fixed => discount,
        DiscountType::Percentage => subtotal * discount / HUNDRED,
    };

    let total = subtotal + tax_amount - discount_amount;

    Ok(InvoiceTotals {
        subtotal: round_money(subtotal),
        tax_amount: round_money(tax_amount),
        discount_amount: round_money(discount_amount),
        total: round_money(total),
    })
}

/// Converte as linhas enviadas pelo cliente nas linhas persistidas,
/// calculando o `amount` de cada uma. A ordem é preservada.
///
/// É aqui que o imposto fora de [0, 100] é rejeitado.
pub fn build_items(payload_items: &[LineItemPayload]) -> Result<Vec<LineItem>, AppError> {
    let mut items = Vec::with_capacity(payload_items.len());

    for item in payload_items {
        if item.tax < Decimal::ZERO || item.tax > HUNDRED {
            return Err(AppError::InvalidInput(format!(
                "O imposto do item '{}' deve estar entre 0 e 100.",
                item.description
            )));
        }

        let amount = calculate_item_amount(item.quantity, item.rate, item.tax)?;
        items.push(LineItem {
            description: item.description.clone(),
            quantity: item.quantity,
            rate: item.rate,
            tax: item.tax,
            amount,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(quantity: &str, rate: &str, tax: &str) -> LineItem {
        LineItem {
            description: "item".to_string(),
            quantity: dec(quantity),
            rate: dec(rate),
            tax: dec(tax),
            amount: calculate_item_amount(dec(quantity), dec(rate), dec(tax)).unwrap(),
        }
    }

    #[test]
    fn valor_do_item_com_imposto() {
        // 2 * 100 * 1.10 = 220.00
        let amount = calculate_item_amount(dec("2"), dec("100"), dec("10")).unwrap();
        assert_eq!(amount, dec("220"));
    }

    #[test]
    fn valor_do_item_nao_arredonda() {
        // 3 * 0.333 = 0.999, fica como está
        let amount = calculate_item_amount(dec("3"), dec("0.333"), dec("0")).unwrap();
        assert_eq!(amount, dec("0.999"));
    }

    #[test]
    fn quantidade_negativa_rejeitada() {
        let result = calculate_item_amount(dec("-1"), dec("100"), dec("0"));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = calculate_item_amount(dec("1"), dec("-100"), dec("0"));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn fatura_vazia_zera_tudo() {
        let totals = calculate_invoice_totals(&[], Decimal::ZERO, DiscountType::Fixed).unwrap();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn desconto_percentual() {
        let items = vec![item("1", "1000", "0")];
        let totals = calculate_invoice_totals(&items, dec("10"), DiscountType::Percentage).unwrap();

        assert_eq!(totals.subtotal, dec("1000.00"));
        assert_eq!(totals.discount_amount, dec("100.00"));
        assert_eq!(totals.total, dec("900.00"));
    }

    #[test]
    fn desconto_fixo() {
        let items = vec![item("1", "1000", "0")];
        let totals = calculate_invoice_totals(&items, dec("50"), DiscountType::Fixed).unwrap();

        assert_eq!(totals.discount_amount, dec("50.00"));
        assert_eq!(totals.total, dec("950.00"));
    }

    #[test]
    fn identidade_dos_agregados() {
        // subtotal + tax_amount - discount_amount = total, com tolerância
        // de 0.01 por causa dos arredondamentos independentes.
        let items = vec![
            item("3", "19.99", "7.5"),
            item("1.5", "120.333", "12"),
            item("7", "0.07", "0"),
        ];
        let totals = calculate_invoice_totals(&items, dec("3.33"), DiscountType::Percentage).unwrap();

        let reconstructed = totals.subtotal + totals.tax_amount - totals.discount_amount;
        let diff = (reconstructed - totals.total).abs();
        assert!(diff <= dec("0.01"), "diferença de {} acima do tolerado", diff);
    }

    #[test]
    fn total_negativo_e_permitido() {
        // Desconto fixo maior que a fatura: o total fica negativo mesmo.
        let items = vec![item("1", "100", "0")];
        let totals = calculate_invoice_totals(&items, dec("150"), DiscountType::Fixed).unwrap();
        assert_eq!(totals.total, dec("-50.00"));
    }

    #[test]
    fn arredondamento_meio_para_cima() {
        let items = vec![item("1", "0.105", "0")];
        let totals = calculate_invoice_totals(&items, Decimal::ZERO, DiscountType::Fixed).unwrap();
        assert_eq!(totals.subtotal, dec("0.11"));
    }

    #[test]
    fn desconto_sobre_fatura_vazia() {
        let totals = calculate_invoice_totals(&[], dec("25"), DiscountType::Fixed).unwrap();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, dec("-25.00"));
    }

    #[test]
    fn build_items_preserva_ordem_e_calcula_amount() {
        let payload = vec![
            LineItemPayload {
                description: "A".to_string(),
                quantity: dec("2"),
                rate: dec("100"),
                tax: dec("10"),
            },
            LineItemPayload {
                description: "B".to_string(),
                quantity: dec("1"),
                rate: dec("50"),
                tax: dec("0"),
            },
            LineItemPayload {
                description: "C".to_string(),
                quantity: dec("4"),
                rate: dec("25.5"),
                tax: dec("5"),
            },
        ];

        let items = build_items(&payload).unwrap();
        let descriptions: Vec<&str> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["A", "B", "C"]);

        assert_eq!(items[0].amount, dec("220"));
        assert_eq!(items[1].amount, dec("50"));
        assert_eq!(items[2].amount, dec("107.1"));
    }

    #[test]
    fn build_items_rejeita_imposto_fora_da_faixa() {
        let payload = vec![LineItemPayload {
            description: "A".to_string(),
            quantity: dec("1"),
            rate: dec("10"),
            tax: dec("101"),
        }];
        assert!(matches!(
            build_items(&payload),
            Err(AppError::InvalidInput(_))
        ));

        // Mas o motor em si aceita, por contrato: quem valida é o caller.
        assert!(calculate_item_amount(dec("1"), dec("10"), dec("101")).is_ok());
    }
}
