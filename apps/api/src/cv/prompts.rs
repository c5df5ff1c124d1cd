// CV analysis prompt templates.

pub const CV_ANALYSIS_SYSTEM: &str = "\
You are an assistant for an IT consulting firm. \
You read consultant CVs (usually in French) and extract a structured profile.";

pub const CV_ANALYSIS_PROMPT: &str = r#"Extract the consultant profile from the CV below.

CV TEXT:
{cv_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "candidate": {"name": "string" | null, "email": "string" | null, "phone": "string" | null},
  "summary": "one or two sentences" | null,
  "technical_skills": ["string"],
  "functional_skills": ["string"],
  "languages": ["string"],
  "missions": [
    {
      "client": "string",
      "role": "string" | null,
      "start_date": "YYYY-MM" | null,
      "end_date": "YYYY-MM" | null,
      "description": "string" | null,
      "technologies": ["string"]
    }
  ],
  "education": ["string"]
}

RULES:
1. One entry in "missions" per client engagement, most recent first.
2. end_date is null for an ongoing mission.
3. technical_skills are tools, languages, frameworks; functional_skills are business domains and methods.
4. {no_invention}"#;
