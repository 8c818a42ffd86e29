// Prompt texts for the routing, grading and generation chains

pub const ROUTER_SYSTEM: &str = "You route a user question either to a vectorstore or to web search.
The vectorstore holds material on LLM agents, prompt engineering and adversarial attacks on LLMs.
Questions on those topics go to the vectorstore; loose keyword overlap is enough.
Everything else goes to web search. Choose 'web_search' or 'vectorstore'.
Reply with a JSON object with the single key 'datasource' and nothing else.";

pub const RELEVANCE_GRADER: &str = "You are grading whether a retrieved document is relevant to a user question.

Retrieved document:
<document>
{content}
</document>

User question:
<question>
{question}
</question>

Mark the document relevant if it contains keywords or meaning related to the question.
This is a loose filter meant only to remove clearly wrong retrievals.
Answer with a binary 'yes' or 'no'.
Reply with a JSON object with the single key 'score' and nothing else.";

pub const HALLUCINATION_GRADER: &str = "You are grading whether an answer is grounded in and supported by a set of facts.

Facts used to write the answer:
<context>
{context}
</context>

Answer:
<answer>
{generation}
</answer>

Answer with a binary 'yes' or 'no' for whether the answer is supported by the facts.
Reply with a JSON object with the single key 'score' and nothing else.";

pub const ANSWER_GRADER: &str = "You are grading whether an answer is useful for resolving a question.

Answer:
<answer>
{generation}
</answer>

Question:
<question>
{question}
</question>

Answer with a binary 'yes' or 'no' for whether the answer resolves the question.
Reply with a JSON object with the single key 'score' and nothing else.";

pub const GENERATOR: &str = "You are an assistant for question-answering tasks.
Use the following pieces of retrieved context to answer the question.
If you don't know the answer, just say that you don't know.
Use three sentences maximum and keep the answer concise.

Question: {question}

Context: {context}

Answer:";

pub const REWRITER: &str = "You rewrite an input question into a better version optimized for vectorstore retrieval.
Consider the underlying intent of the question and formulate an improved one.

Initial question:
<question>
{question}
</question>

Reply with the improved question only, without preamble or explanation.";
