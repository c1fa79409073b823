//! Fixed prompt texts for the completion service.

/// Assistant persona used as the system message for draft and refine calls.
pub const SYSTEM_PROMPT: &str = "あなたはカスタマーサポート担当のAIアシスタントです。
社内資料（コンテキスト）に書かれている内容だけを根拠に、丁寧かつ簡潔な日本語で回答してください。

必須ルール:
- コンテキストに無い情報は推測で補わず「資料に記載がありません」と書く
- 手順がある場合は番号付きの箇条書きで示す
- 期限・金額・条件などの数値は資料の表記どおりに書く
- 問い合わせ先が資料にある場合は、その窓口を案内する";

/// System message for compression calls.
pub const COMPRESS_SYSTEM_PROMPT: &str = "あなたは資料の要約担当です。";

/// Label announced before the compression call.
pub const COMPRESS_LABEL: &str = "資料を要約中...";

/// Label announced before the draft call.
pub const DRAFT_LABEL: &str = "回答案を作成中...";

/// Label announced before refine round `round` of `rounds`.
pub fn refine_label(round: usize, rounds: usize) -> String {
    format!("回答を改善中...（{}/{}）", round, rounds)
}

/// User message for the draft call: the full (possibly compressed) context
/// followed by the question.
pub fn draft_prompt(context: &str, question: &str) -> String {
    format!(
        "[コンテキスト]
{context}

[質問]
{question}

[回答]
"
    )
}

/// User message for one refine round. Carries only the question and the
/// current answer; the context is never resent.
pub fn refine_prompt(question: &str, answer: &str) -> String {
    format!(
        "次の「現在の回答」を自己レビューし、改善した回答だけを出力してください。

必須ルール:
- 「現在の回答」に書かれていない事実や数値を新たに追加しない
- 曖昧な表現を避け、手順は可能なら箇条書きで具体化する
- 根拠が無い記述は削除するか「資料に記載がありません」と書く
- レビューの指摘や説明文は出力しない

[質問]
{question}

[現在の回答]
{answer}

[改善後の回答]
"
    )
}

/// User message for the compression call.
pub fn compress_prompt(context: &str, question: &str, target_tokens: usize) -> String {
    format!(
        "次の資料から、質問に答えるために必要な事実だけを抜き出し、箇条書きで要約してください。

必須ルール:
- 資料に無い情報は書かない
- 問い合わせ先（メールアドレスなど）、期限、金額はそのまま残す
- 全体で約{target_tokens}トークン以内に収める

[質問]
{question}

[資料]
{context}

[要約(箇条書き)]
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_embeds_context_and_question() {
        let p = draft_prompt("CTX", "Q?");
        assert!(p.contains("[コンテキスト]\nCTX\n"));
        assert!(p.contains("[質問]\nQ?\n"));
        assert!(p.ends_with("[回答]\n"));
    }

    #[test]
    fn refine_has_no_context_section() {
        let p = refine_prompt("Q?", "A.");
        assert!(!p.contains("[コンテキスト]"));
        assert!(p.contains("[現在の回答]\nA.\n"));
    }

    #[test]
    fn compress_states_budget() {
        assert!(compress_prompt("CTX", "Q", 300).contains("約300トークン"));
    }
}
