//! 订单号 Luhn 校验
//!
//! 订单号必须是通过 Luhn 算法校验的纯数字串，
//! 在受理上传和提现请求时都要先过这一关。

/// 校验订单号是否为合法的 Luhn 数字串
///
/// 非数字字符或空串直接判为非法。
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let parity = number.len() % 2;
    let sum: u32 = number
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let mut digit = u32::from(b - b'0');
            if i % 2 == parity {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            digit
        })
        .sum();

    sum % 10 == 0
}

/// 生成指定长度的合法 Luhn 数字串（仅测试使用）
#[cfg(test)]
pub(crate) fn generate(length: usize) -> String {
    use rand::Rng;

    assert!(length >= 2, "Luhn 数字串至少需要 2 位");

    let mut rng = rand::rng();
    let mut number: String = (0..length - 1)
        .map(|_| char::from(b'0' + rng.random_range(0..=9u8)))
        .collect();

    // 校验位使补全后的整串通过 is_valid：
    // 补全串长度为 length，前缀位的加倍奇偶性与 (length - 1 + 1) % 2 一致
    let parity = length % 2;
    let sum: u32 = number
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let mut digit = u32::from(b - b'0');
            if i % 2 == parity {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            digit
        })
        .sum();

    let check = (10 - sum % 10) % 10;
    number.push(char::from(b'0' + check as u8));
    number
}
